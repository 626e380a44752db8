//! Data-access boundary for the analytics service.
//!
//! The service never talks to storage directly. It asks an [`AnalyticsSource`]
//! for raw events by tenant and window start, then reduces them with
//! `chairside_core`. Production uses [`crate::db::PgAnalyticsSource`]; tests
//! and offline reports use [`MemorySource`].

use std::collections::BTreeMap;

use chairside_core::{
    AnalyticsError, BookingActivity, FraudLog, LoginAttempt, PlanTier, TenantId, within_range,
    within_window,
};
use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors raised while reading from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The database query failed or returned unusable rows.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The source cannot serve requests at all.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl From<SourceError> for AnalyticsError {
    fn from(err: SourceError) -> Self {
        Self::DataUnavailable(err.to_string())
    }
}

/// Read access to the raw events behind every analytics view.
///
/// Every method is scoped to one tenant. Windowed methods return only events
/// at or after `since`.
pub trait AnalyticsSource: Send + Sync {
    /// Cheap connectivity check for the readiness endpoint.
    fn ping(&self) -> BoxFuture<'_, Result<(), SourceError>>;

    /// The tenant's subscription tier, or `None` if it has no subscription.
    fn plan_tier(&self, tenant: TenantId) -> BoxFuture<'_, Result<Option<PlanTier>, SourceError>>;

    fn login_attempts(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<LoginAttempt>, SourceError>>;

    fn fraud_logs(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<FraudLog>, SourceError>>;

    /// Appointments and slots in `[since, until)`, plus every client record.
    ///
    /// Client records are not windowed: inactivity is judged by a last visit
    /// that falls before the window.
    fn booking_activity(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<BookingActivity, SourceError>>;
}

/// Everything recorded for one tenant in a fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantFixture {
    pub plan: Option<PlanTier>,
    pub login_attempts: Vec<LoginAttempt>,
    pub fraud_logs: Vec<FraudLog>,
    pub booking: BookingActivity,
}

/// Fixture document: tenant id to recorded events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub tenants: BTreeMap<TenantId, TenantFixture>,
}

/// In-memory source backed by a [`Fixture`].
///
/// Unknown tenants have no subscription and no events.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fixture: Fixture,
}

impl MemorySource {
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    /// Parse a JSON fixture document.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        serde_json::from_str(json)
            .map(Self::new)
            .map_err(|e| SourceError::Unavailable(format!("invalid fixture: {e}")))
    }

    /// Add or replace one tenant's events.
    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantId, fixture: TenantFixture) -> Self {
        self.fixture.tenants.insert(tenant, fixture);
        self
    }

    fn tenant(&self, tenant: TenantId) -> Option<&TenantFixture> {
        self.fixture.tenants.get(&tenant)
    }
}

impl AnalyticsSource for MemorySource {
    fn ping(&self) -> BoxFuture<'_, Result<(), SourceError>> {
        future::ready(Ok(())).boxed()
    }

    fn plan_tier(&self, tenant: TenantId) -> BoxFuture<'_, Result<Option<PlanTier>, SourceError>> {
        let plan = self.tenant(tenant).and_then(|t| t.plan);
        future::ready(Ok(plan)).boxed()
    }

    fn login_attempts(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<LoginAttempt>, SourceError>> {
        let attempts = self
            .tenant(tenant)
            .map(|t| within_window(&t.login_attempts, since).cloned().collect())
            .unwrap_or_default();
        future::ready(Ok(attempts)).boxed()
    }

    fn fraud_logs(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<FraudLog>, SourceError>> {
        let logs = self
            .tenant(tenant)
            .map(|t| within_window(&t.fraud_logs, since).cloned().collect())
            .unwrap_or_default();
        future::ready(Ok(logs)).boxed()
    }

    fn booking_activity(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<BookingActivity, SourceError>> {
        let activity = self
            .tenant(tenant)
            .map(|t| BookingActivity {
                appointments: within_range(&t.booking.appointments, since, until)
                    .cloned()
                    .collect(),
                slots: within_range(&t.booking.slots, since, until).cloned().collect(),
                clients: t.booking.clients.clone(),
            })
            .unwrap_or_default();
        future::ready(Ok(activity)).boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const TENANT: &str = "6f1c1f4e-3f55-4a7e-9d0f-2b5bb1a3f0c1";

    fn fixture_json() -> String {
        format!(
            r#"{{
              "tenants": {{
                "{TENANT}": {{
                  "plan": "growth",
                  "loginAttempts": [
                    {{ "email": "Ana@Shop.com", "success": false, "attemptedAt": "2026-03-01T10:00:00Z" }},
                    {{ "email": "ana@shop.com", "success": true, "attemptedAt": "2026-03-02T10:00:00Z" }}
                  ],
                  "booking": {{
                    "slots": [
                      {{ "startsAt": "2026-03-01T09:00:00Z", "booked": false }},
                      {{ "startsAt": "2026-03-20T09:00:00Z", "booked": false }}
                    ],
                    "clients": [
                      {{ "clientId": "0b9a2a43-33a4-4b4e-8bde-1f3c9d7d4a10", "lastVisitAt": "2026-01-01T00:00:00Z" }}
                    ]
                  }}
                }}
              }}
            }}"#
        )
    }

    #[tokio::test]
    async fn test_fixture_round_trip_through_source() {
        let source = MemorySource::from_json(&fixture_json()).unwrap();
        let tenant = TenantId::parse(TENANT).unwrap();

        assert_eq!(source.plan_tier(tenant).await.unwrap(), Some(PlanTier::Growth));

        let since = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let attempts = source.login_attempts(tenant, since).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].success);
        assert_eq!(attempts[0].email.as_str(), "ana@shop.com");
    }

    #[tokio::test]
    async fn test_clients_are_not_windowed() {
        let source = MemorySource::from_json(&fixture_json()).unwrap();
        let tenant = TenantId::parse(TENANT).unwrap();
        let since = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        let until = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();

        let activity = source.booking_activity(tenant, since, until).await.unwrap();
        assert_eq!(activity.clients.len(), 1);
        assert!(activity.appointments.is_empty());
        assert_eq!(activity.slots.len(), 1);
        assert_eq!(activity.slots[0].starts_at, Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_empty() {
        let source = MemorySource::default();
        let tenant = TenantId::new(uuid::Uuid::new_v4());
        let since = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(source.plan_tier(tenant).await.unwrap(), None);
        assert!(source.fraud_logs(tenant, since).await.unwrap().is_empty());
        assert_eq!(
            source.booking_activity(tenant, since, Utc::now()).await.unwrap(),
            BookingActivity::default()
        );
    }

    #[test]
    fn test_malformed_fixture() {
        let err = MemorySource::from_json("{\"tenants\": 3}").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        let analytics: AnalyticsError = err.into();
        assert!(matches!(analytics, AnalyticsError::DataUnavailable(_)));
    }
}
