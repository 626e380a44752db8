//! Plan-based feature visibility.
//!
//! The gate decides how a feature is presented for a plan: shown, shown as a
//! blurred preview with an upgrade prompt, or locked. It is advisory. A
//! caller that holds restricted data must check the resolved tier itself
//! before sending it anywhere; the dashboard service does this by withholding
//! figures whose visibility is not [`Visibility::Visible`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::types::{PlanStatus, PlanTier};

/// A gated product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    GrowthOpportunities,
    LostRevenueBreakdown,
    ClientRiskScores,
    LoginMonitor,
    FraudMonitor,
    MarketingPosts,
    AutomatedReminders,
    ExpenseReports,
    BookingCalendar,
    CustomerCrm,
    Payments,
}

impl FeatureId {
    /// Every feature, in display order.
    pub const ALL: [Self; 11] = [
        Self::GrowthOpportunities,
        Self::LostRevenueBreakdown,
        Self::ClientRiskScores,
        Self::LoginMonitor,
        Self::FraudMonitor,
        Self::MarketingPosts,
        Self::AutomatedReminders,
        Self::ExpenseReports,
        Self::BookingCalendar,
        Self::CustomerCrm,
        Self::Payments,
    ];
}

/// How a feature is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    /// Rendered blurred with an upgrade call-to-action.
    BlurredPreview,
    Locked,
}

impl Visibility {
    /// Whether the presentation should offer an upgrade.
    #[must_use]
    pub const fn requires_upgrade(&self) -> bool {
        !matches!(self, Self::Visible)
    }
}

/// Restriction applied to a feature on the start plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    BlurredPreview,
    Locked,
}

impl From<Restriction> for Visibility {
    fn from(restriction: Restriction) -> Self {
        match restriction {
            Restriction::BlurredPreview => Self::BlurredPreview,
            Restriction::Locked => Self::Locked,
        }
    }
}

/// Which features the start plan restricts, and how.
///
/// Features not listed are visible on every plan. The growth plan sees
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFeatureTable {
    pub start: BTreeMap<FeatureId, Restriction>,
}

impl Default for PlanFeatureTable {
    fn default() -> Self {
        let start = [
            FeatureId::GrowthOpportunities,
            FeatureId::LostRevenueBreakdown,
            FeatureId::ClientRiskScores,
            FeatureId::AutomatedReminders,
            FeatureId::MarketingPosts,
        ]
        .into_iter()
        .map(|feature| (feature, Restriction::BlurredPreview))
        .collect();
        Self { start }
    }
}

impl PlanFeatureTable {
    /// Check that the start plan leaves at least one feature usable.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Configuration`] if every feature is restricted.
    pub fn validate(&self) -> Result<()> {
        if FeatureId::ALL
            .iter()
            .all(|feature| self.start.contains_key(feature))
        {
            return Err(AnalyticsError::Configuration(
                "start plan restricts every feature".to_owned(),
            ));
        }
        Ok(())
    }

    /// Visibility of a feature for a known tier.
    #[must_use]
    pub fn visibility(&self, tier: PlanTier, feature: FeatureId) -> Visibility {
        match tier {
            PlanTier::Growth => Visibility::Visible,
            PlanTier::Start => self
                .start
                .get(&feature)
                .map_or(Visibility::Visible, |restriction| (*restriction).into()),
        }
    }
}

/// Resolve how `feature` is presented for a plan status.
///
/// While the plan is still loading the feature is shown, so a paying tenant
/// never sees a lock flash on screen.
#[must_use]
pub fn resolve_feature_visibility(
    table: &PlanFeatureTable,
    plan: PlanStatus,
    feature: FeatureId,
) -> Visibility {
    match plan {
        PlanStatus::Loading => Visibility::Visible,
        PlanStatus::Resolved(tier) => table.visibility(tier, feature),
    }
}

/// Visibility of every feature for a plan status, in display order.
#[must_use]
pub fn resolve_all(table: &PlanFeatureTable, plan: PlanStatus) -> BTreeMap<FeatureId, Visibility> {
    FeatureId::ALL
        .into_iter()
        .map(|feature| (feature, resolve_feature_visibility(table, plan, feature)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_sees_everything() {
        let table = PlanFeatureTable::default();
        for feature in FeatureId::ALL {
            assert_eq!(
                resolve_feature_visibility(&table, PlanTier::Growth.into(), feature),
                Visibility::Visible
            );
        }
    }

    #[test]
    fn test_start_gets_blurred_preview_for_restricted() {
        let table = PlanFeatureTable::default();
        let start = PlanStatus::Resolved(PlanTier::Start);
        assert_eq!(
            resolve_feature_visibility(&table, start, FeatureId::GrowthOpportunities),
            Visibility::BlurredPreview
        );
        assert_eq!(
            resolve_feature_visibility(&table, start, FeatureId::BookingCalendar),
            Visibility::Visible
        );
    }

    #[test]
    fn test_loading_is_optimistic() {
        let table = PlanFeatureTable::default();
        assert_eq!(
            resolve_feature_visibility(&table, PlanStatus::Loading, FeatureId::ClientRiskScores),
            Visibility::Visible
        );
    }

    #[test]
    fn test_locked_restriction_from_config() {
        let table: PlanFeatureTable =
            serde_yaml::from_str("start:\n  marketing_posts: locked\n").unwrap();
        assert_eq!(
            table.visibility(PlanTier::Start, FeatureId::MarketingPosts),
            Visibility::Locked
        );
        assert!(Visibility::Locked.requires_upgrade());
        assert_eq!(
            table.visibility(PlanTier::Start, FeatureId::GrowthOpportunities),
            Visibility::Visible
        );
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        assert!(serde_yaml::from_str::<PlanFeatureTable>("start:\n  teleport: locked\n").is_err());
    }

    #[test]
    fn test_restricting_everything_is_invalid() {
        let table = PlanFeatureTable {
            start: FeatureId::ALL
                .into_iter()
                .map(|f| (f, Restriction::Locked))
                .collect(),
        };
        assert!(matches!(table.validate(), Err(AnalyticsError::Configuration(_))));
    }

    #[test]
    fn test_resolve_all_covers_every_feature() {
        let all = resolve_all(&PlanFeatureTable::default(), PlanTier::Start.into());
        assert_eq!(all.len(), FeatureId::ALL.len());
        assert_eq!(all[&FeatureId::Payments], Visibility::Visible);
    }
}
