//! Lost-revenue and recoverable-revenue estimation.
//!
//! Every category of lost business (no-shows, cancellations, empty slots,
//! inactive clients) is priced at the tenant's average ticket. The recoverable
//! share is then estimated per category from a [`RecoveryRateTable`]; the
//! table is the only place rates live, and both [`calculate_growth_opportunity`]
//! and [`get_recovery_estimate`] read it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::types::Money;

/// A category of lost revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCategory {
    NoShows,
    Cancellations,
    EmptySlots,
    InactiveClients,
}

impl LossCategory {
    /// All categories, in reporting order.
    pub const ALL: [Self; 4] = [
        Self::NoShows,
        Self::Cancellations,
        Self::EmptySlots,
        Self::InactiveClients,
    ];

    /// Returns the canonical `snake_case` name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoShows => "no_shows",
            Self::Cancellations => "cancellations",
            Self::EmptySlots => "empty_slots",
            Self::InactiveClients => "inactive_clients",
        }
    }
}

impl core::str::FromStr for LossCategory {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AnalyticsError::InvalidInput(format!("unknown loss category: {s:?}")))
    }
}

/// Estimated fraction of each loss category that retention features recover.
///
/// Deserialization requires every category and rejects unknown keys; call
/// [`RecoveryRateTable::validate`] to enforce the `(0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryRateTable {
    pub no_shows: Decimal,
    pub cancellations: Decimal,
    pub empty_slots: Decimal,
    pub inactive_clients: Decimal,
}

impl Default for RecoveryRateTable {
    fn default() -> Self {
        Self {
            no_shows: Decimal::new(6, 1),
            cancellations: Decimal::new(5, 1),
            empty_slots: Decimal::new(4, 1),
            inactive_clients: Decimal::new(3, 1),
        }
    }
}

impl RecoveryRateTable {
    /// The recovery fraction for a category.
    #[must_use]
    pub const fn rate(&self, category: LossCategory) -> Decimal {
        match category {
            LossCategory::NoShows => self.no_shows,
            LossCategory::Cancellations => self.cancellations,
            LossCategory::EmptySlots => self.empty_slots,
            LossCategory::InactiveClients => self.inactive_clients,
        }
    }

    /// Check that every rate lies in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Configuration`] naming the first offending category.
    pub fn validate(&self) -> Result<()> {
        for category in LossCategory::ALL {
            let rate = self.rate(category);
            if rate <= Decimal::ZERO || rate > Decimal::ONE {
                return Err(AnalyticsError::Configuration(format!(
                    "recovery rate for {} must be in (0, 1], got {rate}",
                    category.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Behavioral counts for one tenant over the growth-metrics window.
///
/// Construction rejects a negative average ticket, so every value of this type
/// is a valid calculator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBarberMetrics")]
pub struct BarberMetrics {
    avg_ticket: Money,
    no_shows_last_30_days: u32,
    cancellations_last_30_days: u32,
    empty_slots_last_30_days: u32,
    inactive_clients_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBarberMetrics {
    avg_ticket: Money,
    no_shows_last_30_days: u32,
    cancellations_last_30_days: u32,
    empty_slots_last_30_days: u32,
    inactive_clients_count: u32,
}

impl TryFrom<RawBarberMetrics> for BarberMetrics {
    type Error = AnalyticsError;

    fn try_from(raw: RawBarberMetrics) -> Result<Self> {
        Self::new(
            raw.avg_ticket,
            raw.no_shows_last_30_days,
            raw.cancellations_last_30_days,
            raw.empty_slots_last_30_days,
            raw.inactive_clients_count,
        )
    }
}

impl BarberMetrics {
    /// Build a metrics snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidInput`] if `avg_ticket` is negative.
    pub fn new(
        avg_ticket: Money,
        no_shows: u32,
        cancellations: u32,
        empty_slots: u32,
        inactive_clients: u32,
    ) -> Result<Self> {
        if avg_ticket.is_negative() {
            return Err(AnalyticsError::InvalidInput(format!(
                "average ticket cannot be negative, got {avg_ticket}"
            )));
        }
        Ok(Self {
            avg_ticket,
            no_shows_last_30_days: no_shows,
            cancellations_last_30_days: cancellations,
            empty_slots_last_30_days: empty_slots,
            inactive_clients_count: inactive_clients,
        })
    }

    #[must_use]
    pub const fn avg_ticket(&self) -> Money {
        self.avg_ticket
    }

    /// The count recorded for a loss category.
    #[must_use]
    pub const fn count(&self, category: LossCategory) -> u32 {
        match category {
            LossCategory::NoShows => self.no_shows_last_30_days,
            LossCategory::Cancellations => self.cancellations_last_30_days,
            LossCategory::EmptySlots => self.empty_slots_last_30_days,
            LossCategory::InactiveClients => self.inactive_clients_count,
        }
    }
}

/// Estimated lost and recoverable revenue derived from [`BarberMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthOpportunity {
    pub missed_revenue_from_no_shows: Money,
    pub missed_revenue_from_cancellations: Money,
    pub missed_revenue_from_empty_slots: Money,
    pub missed_revenue_from_inactive_clients: Money,
    pub total_missed_revenue: Money,
    pub potential_recovery_with_growth: Money,
}

impl GrowthOpportunity {
    /// The missed revenue for one category.
    #[must_use]
    pub const fn missed_revenue(&self, category: LossCategory) -> Money {
        match category {
            LossCategory::NoShows => self.missed_revenue_from_no_shows,
            LossCategory::Cancellations => self.missed_revenue_from_cancellations,
            LossCategory::EmptySlots => self.missed_revenue_from_empty_slots,
            LossCategory::InactiveClients => self.missed_revenue_from_inactive_clients,
        }
    }
}

/// Estimate how much of `lost_value` in `category` is recoverable.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidInput`] if the product overflows.
pub fn get_recovery_estimate(
    rates: &RecoveryRateTable,
    category: LossCategory,
    lost_value: Money,
) -> Result<Money> {
    lost_value
        .checked_scale(rates.rate(category))
        .ok_or_else(|| overflow(&format!("recoverable {}", category.as_str())))
}

/// Price every loss category and estimate the recoverable total.
///
/// The recoverable amount is the sum of per-category estimates, not the total
/// times a blended rate. No intermediate value is rounded.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidInput`] if any amount overflows.
pub fn calculate_growth_opportunity(
    metrics: &BarberMetrics,
    rates: &RecoveryRateTable,
) -> Result<GrowthOpportunity> {
    let mut missed = [Money::ZERO; 4];
    for (slot, category) in missed.iter_mut().zip(LossCategory::ALL) {
        *slot = metrics
            .avg_ticket
            .checked_times(metrics.count(category))
            .ok_or_else(|| overflow(&format!("missed {}", category.as_str())))?;
    }
    let [no_shows, cancellations, empty_slots, inactive_clients] = missed;

    let total_missed_revenue =
        Money::checked_sum(missed).ok_or_else(|| overflow("total missed revenue"))?;

    let mut recoverable = Vec::with_capacity(missed.len());
    for (category, lost) in LossCategory::ALL.into_iter().zip(missed) {
        recoverable.push(get_recovery_estimate(rates, category, lost)?);
    }
    let potential_recovery_with_growth =
        Money::checked_sum(recoverable).ok_or_else(|| overflow("potential recovery"))?;

    Ok(GrowthOpportunity {
        missed_revenue_from_no_shows: no_shows,
        missed_revenue_from_cancellations: cancellations,
        missed_revenue_from_empty_slots: empty_slots,
        missed_revenue_from_inactive_clients: inactive_clients,
        total_missed_revenue,
        potential_recovery_with_growth,
    })
}

fn overflow(what: &str) -> AnalyticsError {
    AnalyticsError::InvalidInput(format!("{what} is out of range"))
}
