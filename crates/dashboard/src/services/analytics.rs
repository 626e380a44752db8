//! Analytics views served to the tenant dashboard.
//!
//! Each view fetches its inputs and the tenant's plan concurrently, reduces
//! them with `chairside_core`, and withholds figures the plan may not see.
//! Withheld data is never computed into the response: a blurred preview on
//! the start plan receives the visibility and no numbers.
//!
//! The clock is always passed in, so every view is reproducible.

use std::collections::BTreeMap;
use std::sync::Arc;

use chairside_core::{
    AnalyticsError, AnalyticsPolicy, AppointmentStatusCount, BarberMetrics, ClientRisk,
    ClientRiskLevel, DailyLoginCount, FeatureId, FraudStats, FraudTotals, GROWTH_METRICS_WINDOW,
    IdentityRisk, LoginAttemptStats, LossCategory, Money, PlanStatus, PlanTier, TenantId,
    Visibility, aggregate_barber_metrics, aggregate_fraud_stats, aggregate_login_attempt_stats,
    appointment_status_counts, calculate_growth_opportunity, classify_identities,
    daily_login_counts, get_recovery_estimate, resolve_all, resolve_feature_visibility,
    score_client_risk, summarize_fraud_stats, window_start,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use super::plans::PlanResolver;
use crate::source::AnalyticsSource;

/// Shortest monitoring window a caller may ask for.
pub const MIN_MONITOR_WINDOW: Duration = Duration::hours(1);

/// Longest monitoring window a caller may ask for.
pub const MAX_MONITOR_WINDOW: Duration = Duration::days(30);

type Result<T> = std::result::Result<T, AnalyticsError>;

// =============================================================================
// Response Types
// =============================================================================

/// A view whose data depends on the tenant's plan.
///
/// `data` is present only when `visibility` is [`Visibility::Visible`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gated<T> {
    pub plan: PlanTier,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Gated<T> {
    fn new(plan: PlanTier, visibility: Visibility, data: impl FnOnce() -> T) -> Self {
        let data = (visibility == Visibility::Visible).then(data);
        Self {
            plan,
            visibility,
            data,
        }
    }

    const fn withheld(plan: PlanTier, visibility: Visibility) -> Self {
        Self {
            plan,
            visibility,
            data: None,
        }
    }
}

/// Visibility of every feature for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReport {
    pub plan: PlanTier,
    pub features: BTreeMap<FeatureId, Visibility>,
}

/// Lost revenue for a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLoss {
    pub category: LossCategory,
    pub count: u32,
    pub missed_revenue: Money,
    pub recoverable: Money,
    pub formatted_missed_revenue: String,
}

/// Growth opportunity over the trailing 30 days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthReport {
    pub window_start: DateTime<Utc>,
    pub metrics: BarberMetrics,
    pub total_missed_revenue: Money,
    pub potential_recovery_with_growth: Money,
    pub formatted_total_missed_revenue: String,
    pub formatted_potential_recovery: String,
    pub appointment_statuses: Vec<AppointmentStatusCount>,
    /// Present only when the lost-revenue breakdown is visible.
    pub breakdown: Gated<Vec<CategoryLoss>>,
}

/// Recoverable share of a single lost amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryEstimate {
    pub category: LossCategory,
    pub lost_value: Money,
    pub rate: Decimal,
    pub recoverable: Money,
    pub formatted: String,
}

/// Sign-in activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReport {
    pub window_start: DateTime<Utc>,
    pub stats: LoginAttemptStats,
    pub daily: Vec<DailyLoginCount>,
    pub identities: Vec<IdentityRisk>,
}

/// Registration fraud activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudReport {
    pub window_start: DateTime<Utc>,
    pub totals: FraudTotals,
    pub ips: Vec<FraudStats>,
}

/// Churn risk for every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRiskReport {
    pub window_start: DateTime<Utc>,
    pub by_level: BTreeMap<ClientRiskLevel, u32>,
    pub clients: Vec<ClientRisk>,
}

/// Every view for one tenant, as printed by offline reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantReport {
    pub tenant: TenantId,
    pub generated_at: DateTime<Utc>,
    pub features: FeatureReport,
    pub growth: Gated<GrowthReport>,
    pub logins: Gated<LoginReport>,
    pub fraud: Gated<FraudReport>,
    pub client_risk: Gated<ClientRiskReport>,
}

// =============================================================================
// Service
// =============================================================================

/// Computes dashboard analytics from an [`AnalyticsSource`].
#[derive(Clone)]
pub struct AnalyticsService {
    source: Arc<dyn AnalyticsSource>,
    plans: PlanResolver,
    policy: Arc<AnalyticsPolicy>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        source: Arc<dyn AnalyticsSource>,
        plans: PlanResolver,
        policy: Arc<AnalyticsPolicy>,
    ) -> Self {
        Self {
            source,
            plans,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &AnalyticsPolicy {
        &self.policy
    }

    fn visibility(&self, plan: PlanTier, feature: FeatureId) -> Visibility {
        resolve_feature_visibility(&self.policy.plan_features, PlanStatus::Resolved(plan), feature)
    }

    /// Visibility of every feature for the tenant's plan.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::DataUnavailable` if the plan cannot be read.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn features(&self, tenant: TenantId) -> Result<FeatureReport> {
        let plan = self.plans.resolve(tenant).await?;
        Ok(FeatureReport {
            plan,
            features: resolve_all(&self.policy.plan_features, plan.into()),
        })
    }

    /// Lost and recoverable revenue over the 30 days before `now`.
    ///
    /// Calendar entries at or after `now` are not fetched.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::DataUnavailable` if any input cannot be read,
    /// or `AnalyticsError::InvalidInput` if the booking data yields a negative
    /// average ticket or amounts that overflow.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn growth_opportunity(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Gated<GrowthReport>> {
        let start = window_start(now, GROWTH_METRICS_WINDOW);
        let (plan, activity) = tokio::try_join!(
            self.plans.resolve(tenant),
            self.source.booking_activity(tenant, start, now),
        )?;

        let visibility = self.visibility(plan, FeatureId::GrowthOpportunities);
        if visibility != Visibility::Visible {
            debug!(%plan, ?visibility, "Withholding growth opportunity");
            return Ok(Gated::withheld(plan, visibility));
        }

        let metrics = aggregate_barber_metrics(&activity, start, now)?;
        let rates = &self.policy.recovery_rates;
        let opportunity = calculate_growth_opportunity(&metrics, rates)?;
        let currency = self.policy.currency;

        let breakdown_visibility = self.visibility(plan, FeatureId::LostRevenueBreakdown);
        let breakdown = if breakdown_visibility == Visibility::Visible {
            let mut losses = Vec::with_capacity(LossCategory::ALL.len());
            for category in LossCategory::ALL {
                let missed_revenue = opportunity.missed_revenue(category);
                losses.push(CategoryLoss {
                    category,
                    count: metrics.count(category),
                    missed_revenue,
                    recoverable: get_recovery_estimate(rates, category, missed_revenue)?,
                    formatted_missed_revenue: currency.format(missed_revenue),
                });
            }
            Gated::new(plan, breakdown_visibility, || losses)
        } else {
            Gated::withheld(plan, breakdown_visibility)
        };

        let report = GrowthReport {
            window_start: start,
            metrics,
            total_missed_revenue: opportunity.total_missed_revenue,
            potential_recovery_with_growth: opportunity.potential_recovery_with_growth,
            formatted_total_missed_revenue: currency.format(opportunity.total_missed_revenue),
            formatted_potential_recovery: currency
                .format(opportunity.potential_recovery_with_growth),
            appointment_statuses: appointment_status_counts(&activity, start, now),
            breakdown,
        };
        Ok(Gated::new(plan, visibility, || report))
    }

    /// Recoverable share of `lost_value` in `category`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidInput` if `lost_value` is negative or
    /// too large to scale, or `AnalyticsError::DataUnavailable` if the plan
    /// cannot be read.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn recovery_estimate(
        &self,
        tenant: TenantId,
        category: LossCategory,
        lost_value: Money,
    ) -> Result<Gated<RecoveryEstimate>> {
        if lost_value.is_negative() {
            return Err(AnalyticsError::InvalidInput(format!(
                "lost value cannot be negative, got {lost_value}"
            )));
        }

        let plan = self.plans.resolve(tenant).await?;
        let visibility = self.visibility(plan, FeatureId::GrowthOpportunities);
        if visibility != Visibility::Visible {
            return Ok(Gated::withheld(plan, visibility));
        }

        let rates = &self.policy.recovery_rates;
        let recoverable = get_recovery_estimate(rates, category, lost_value)?;
        let estimate = RecoveryEstimate {
            category,
            lost_value,
            rate: rates.rate(category),
            recoverable,
            formatted: self.policy.currency.format(recoverable),
        };
        Ok(Gated::new(plan, visibility, || estimate))
    }

    /// Sign-in statistics over `window` before `now`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidInput` for a window outside
    /// `(0, MAX_MONITOR_WINDOW]`, or `AnalyticsError::DataUnavailable` if the
    /// attempts cannot be read.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn login_stats(
        &self,
        tenant: TenantId,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Gated<LoginReport>> {
        let start = window_start(now, check_window(window)?);
        let (plan, attempts) = tokio::try_join!(
            self.plans.resolve(tenant),
            self.source.login_attempts(tenant, start),
        )?;

        let visibility = self.visibility(plan, FeatureId::LoginMonitor);
        Ok(Gated::new(plan, visibility, || LoginReport {
            window_start: start,
            stats: aggregate_login_attempt_stats(&attempts, start),
            daily: daily_login_counts(&attempts, start),
            identities: classify_identities(&attempts, start),
        }))
    }

    /// Per-IP registration statistics over `window` before `now`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AnalyticsService::login_stats`].
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn fraud_stats(
        &self,
        tenant: TenantId,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Gated<FraudReport>> {
        let start = window_start(now, check_window(window)?);
        let (plan, logs) = tokio::try_join!(
            self.plans.resolve(tenant),
            self.source.fraud_logs(tenant, start),
        )?;

        let visibility = self.visibility(plan, FeatureId::FraudMonitor);
        Ok(Gated::new(plan, visibility, || {
            let ips = aggregate_fraud_stats(&logs);
            FraudReport {
                window_start: start,
                totals: summarize_fraud_stats(&ips),
                ips,
            }
        }))
    }

    /// Churn risk for every client, judged at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::DataUnavailable` if the booking data cannot be
    /// read.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn client_risk(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Gated<ClientRiskReport>> {
        let start = window_start(now, GROWTH_METRICS_WINDOW);
        let (plan, activity) = tokio::try_join!(
            self.plans.resolve(tenant),
            self.source.booking_activity(tenant, start, now),
        )?;

        let visibility = self.visibility(plan, FeatureId::ClientRiskScores);
        Ok(Gated::new(plan, visibility, || {
            let clients = score_client_risk(&activity, start, now);
            let mut by_level = BTreeMap::new();
            for client in &clients {
                *by_level.entry(client.level).or_insert(0) += 1;
            }
            ClientRiskReport {
                window_start: start,
                by_level,
                clients,
            }
        }))
    }

    /// Every view for one tenant, using the default monitoring window.
    ///
    /// # Errors
    ///
    /// Fails with the first error raised by any view.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn tenant_report(&self, tenant: TenantId, now: DateTime<Utc>) -> Result<TenantReport> {
        let window = chairside_core::LOGIN_STATS_WINDOW;
        let (features, growth, logins, fraud, client_risk) = tokio::try_join!(
            self.features(tenant),
            self.growth_opportunity(tenant, now),
            self.login_stats(tenant, window, now),
            self.fraud_stats(tenant, window, now),
            self.client_risk(tenant, now),
        )?;

        Ok(TenantReport {
            tenant,
            generated_at: now,
            features,
            growth,
            logins,
            fraud,
            client_risk,
        })
    }
}

fn check_window(window: Duration) -> Result<Duration> {
    if window < MIN_MONITOR_WINDOW || window > MAX_MONITOR_WINDOW {
        return Err(AnalyticsError::InvalidInput(format!(
            "window must be between {} hour and {} days, got {} minutes",
            MIN_MONITOR_WINDOW.num_hours(),
            MAX_MONITOR_WINDOW.num_days(),
            window.num_minutes()
        )));
    }
    Ok(window)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chairside_core::{
        Appointment, AppointmentStatus, AvailabilitySlot, BookingActivity, ClientId, ClientRecord,
        Email, LoginAttempt,
    };
    use chrono::TimeZone;

    use super::*;
    use crate::source::{MemorySource, TenantFixture};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 31, 12, 0, 0).unwrap()
    }

    fn appointment(status: AppointmentStatus, days_ago: i64) -> Appointment {
        Appointment {
            client_id: ClientId::new(uuid::Uuid::from_u128(1)),
            status,
            price: Money::from_major(100),
            scheduled_at: now() - Duration::days(days_ago),
        }
    }

    /// 10 no-shows, 4 cancellations, 6 empty slots, 2 inactive clients at a
    /// R$100 ticket.
    fn booking() -> BookingActivity {
        let mut appointments = vec![appointment(AppointmentStatus::Completed, 2)];
        appointments.extend((0..10).map(|_| appointment(AppointmentStatus::NoShow, 3)));
        appointments.extend((0..4).map(|_| appointment(AppointmentStatus::Cancelled, 4)));

        let slots = (0..6)
            .map(|_| AvailabilitySlot {
                starts_at: now() - Duration::days(1),
                booked: false,
            })
            .collect();

        let clients = (10..12)
            .map(|n| ClientRecord {
                client_id: ClientId::new(uuid::Uuid::from_u128(n)),
                last_visit_at: Some(now() - Duration::days(90)),
            })
            .collect();

        BookingActivity {
            appointments,
            slots,
            clients,
        }
    }

    fn service(plan: PlanTier) -> (AnalyticsService, TenantId) {
        let tenant = TenantId::new(uuid::Uuid::from_u128(42));
        let failures = (0..5).map(|minutes| LoginAttempt {
            email: Email::parse("ana@shop.com").unwrap(),
            ip_address: None,
            success: false,
            attempted_at: now() - Duration::minutes(minutes),
        });
        let source = Arc::new(MemorySource::default().with_tenant(
            tenant,
            TenantFixture {
                plan: Some(plan),
                login_attempts: failures.collect(),
                fraud_logs: Vec::new(),
                booking: booking(),
            },
        ));
        let plans = PlanResolver::new(source.clone(), std::time::Duration::from_secs(60));
        let service = AnalyticsService::new(source, plans, Arc::new(AnalyticsPolicy::default()));
        (service, tenant)
    }

    #[tokio::test]
    async fn test_growth_plan_sees_opportunity() {
        let (service, tenant) = service(PlanTier::Growth);
        let report = service.growth_opportunity(tenant, now()).await.unwrap();
        assert_eq!(report.visibility, Visibility::Visible);

        let growth = report.data.unwrap();
        assert_eq!(growth.metrics.avg_ticket(), Money::from_major(100));
        assert_eq!(growth.total_missed_revenue, Money::from_major(2200));
        assert_eq!(growth.potential_recovery_with_growth, Money::from_major(1100));
        assert_eq!(growth.formatted_total_missed_revenue, "R$\u{a0}2.200,00");

        let breakdown = growth.breakdown.data.unwrap();
        assert_eq!(breakdown.len(), 4);
        assert_eq!(breakdown[0].category, LossCategory::NoShows);
        assert_eq!(breakdown[0].missed_revenue, Money::from_major(1000));
        assert_eq!(breakdown[0].recoverable, Money::from_major(600));
    }

    #[tokio::test]
    async fn test_start_plan_gets_preview_without_figures() {
        let (service, tenant) = service(PlanTier::Start);
        let report = service.growth_opportunity(tenant, now()).await.unwrap();
        assert_eq!(report.plan, PlanTier::Start);
        assert_eq!(report.visibility, Visibility::BlurredPreview);
        assert!(report.data.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_login_stats_visible_on_start() {
        let (service, tenant) = service(PlanTier::Start);
        let report = service
            .login_stats(tenant, chairside_core::LOGIN_STATS_WINDOW, now())
            .await
            .unwrap();
        let logins = report.data.unwrap();
        assert_eq!(logins.stats.failed_attempts, 5);
        assert_eq!(logins.stats.blocked_accounts, 1);
        assert_eq!(logins.identities.len(), 1);
    }

    #[tokio::test]
    async fn test_window_out_of_range() {
        let (service, tenant) = service(PlanTier::Growth);
        let err = service
            .login_stats(tenant, Duration::days(31), now())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
        assert!(service
            .fraud_stats(tenant, Duration::zero(), now())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_sub_hour_window_is_rejected() {
        let (service, tenant) = service(PlanTier::Growth);
        for window in [Duration::minutes(30), Duration::seconds(1)] {
            let err = service.login_stats(tenant, window, now()).await.unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidInput(_)));
            assert!(service.fraud_stats(tenant, window, now()).await.is_err());
        }
        assert!(service
            .login_stats(tenant, MIN_MONITOR_WINDOW, now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_growth_ignores_future_calendar() {
        let tenant = TenantId::new(uuid::Uuid::from_u128(43));
        let mut activity = booking();
        activity.slots.extend((1..=20).map(|hours| AvailabilitySlot {
            starts_at: now() + Duration::hours(hours),
            booked: false,
        }));
        activity
            .appointments
            .push(appointment(AppointmentStatus::Cancelled, -2));
        let source = Arc::new(MemorySource::default().with_tenant(
            tenant,
            TenantFixture {
                plan: Some(PlanTier::Growth),
                login_attempts: Vec::new(),
                fraud_logs: Vec::new(),
                booking: activity,
            },
        ));
        let plans = PlanResolver::new(source.clone(), std::time::Duration::from_secs(60));
        let service = AnalyticsService::new(source, plans, Arc::new(AnalyticsPolicy::default()));

        let growth = service
            .growth_opportunity(tenant, now())
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(growth.metrics.count(LossCategory::EmptySlots), 6);
        assert_eq!(growth.metrics.count(LossCategory::Cancellations), 4);
        assert_eq!(growth.total_missed_revenue, Money::from_major(2200));
    }

    #[tokio::test]
    async fn test_recovery_estimate_overflow_is_invalid_input() {
        let tenant = TenantId::new(uuid::Uuid::from_u128(44));
        let huge = Money::new(rust_decimal::Decimal::MAX);
        let mut policy = AnalyticsPolicy::default();
        policy.recovery_rates.no_shows = rust_decimal::Decimal::from(10);
        let source = Arc::new(MemorySource::default().with_tenant(
            tenant,
            TenantFixture {
                plan: Some(PlanTier::Growth),
                login_attempts: Vec::new(),
                fraud_logs: Vec::new(),
                booking: BookingActivity::default(),
            },
        ));
        let plans = PlanResolver::new(source.clone(), std::time::Duration::from_secs(60));
        let service = AnalyticsService::new(source, plans, Arc::new(policy));
        let err = service
            .recovery_estimate(tenant, LossCategory::NoShows, huge)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_recovery_estimate() {
        let (service, tenant) = service(PlanTier::Growth);
        let estimate = service
            .recovery_estimate(tenant, LossCategory::EmptySlots, Money::from_major(600))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(estimate.recoverable, Money::from_major(240));

        let err = service
            .recovery_estimate(tenant, LossCategory::EmptySlots, Money::from_major(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_client_risk_counts_levels() {
        let (service, tenant) = service(PlanTier::Growth);
        let risk = service.client_risk(tenant, now()).await.unwrap().data.unwrap();
        // Both listed clients last visited 90 days ago.
        assert_eq!(risk.by_level.get(&ClientRiskLevel::High), Some(&2));
        assert_eq!(risk.clients.len(), 2);
    }

    #[tokio::test]
    async fn test_tenant_report_combines_views() {
        let (service, tenant) = service(PlanTier::Start);
        let report = service.tenant_report(tenant, now()).await.unwrap();
        assert_eq!(report.features.plan, PlanTier::Start);
        assert!(report.growth.data.is_none());
        assert!(report.client_risk.data.is_none());
        assert!(report.logins.data.is_some());
        assert!(report.fraud.data.is_some());
    }
}
