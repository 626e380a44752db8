//! Integration tests for Chairside.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chairside-integration-tests
//! ```
//!
//! The dashboard router is driven in-process with `tower::ServiceExt::oneshot`
//! over a [`MemorySource`], so no database or listening socket is needed.
//!
//! # Fixture
//!
//! Two tenants share the same events and differ only by plan:
//!
//! - 30-day booking: R$100 ticket, 10 no-shows, 4 cancellations, 6 empty slots,
//!   2 inactive clients
//! - Last 24h logins: `a@x.com` 5 failures, `b@x.com` 4 failures and 1 success
//! - Registrations from two IPs

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode},
};
use chairside_core::{
    AnalyticsPolicy, Appointment, AppointmentStatus, AvailabilitySlot, BookingActivity, ClientId,
    ClientRecord, DeviceId, Email, FraudLog, FraudStatus, LoginAttempt, Money, PlanTier,
    TenantId,
};
use chairside_dashboard::{
    AnalyticsSource, AppState, FixedClock, MemorySource, SourceError, TenantFixture,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Evaluation time used by every test.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 31, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Tenant on the growth plan.
#[must_use]
pub const fn growth_tenant() -> TenantId {
    TenantId::new(Uuid::from_u128(0x1001))
}

/// Tenant on the start plan.
#[must_use]
pub const fn start_tenant() -> TenantId {
    TenantId::new(Uuid::from_u128(0x1002))
}

/// Tenant with no subscription row.
#[must_use]
pub const fn unsubscribed_tenant() -> TenantId {
    TenantId::new(Uuid::from_u128(0x1003))
}

fn email(raw: &str) -> Email {
    Email::parse(raw).expect("valid fixture email")
}

fn booking() -> BookingActivity {
    let regular = ClientId::new(Uuid::from_u128(1));
    let appointment = |status, days_ago| Appointment {
        client_id: regular,
        status,
        price: Money::from_major(100),
        scheduled_at: now() - Duration::days(days_ago),
    };

    let mut appointments = vec![appointment(AppointmentStatus::Completed, 1)];
    appointments.extend((0..10).map(|_| appointment(AppointmentStatus::NoShow, 5)));
    appointments.extend((0..4).map(|_| appointment(AppointmentStatus::Cancelled, 6)));
    // Outside the 30-day window.
    appointments.push(appointment(AppointmentStatus::NoShow, 45));
    // Upcoming, not yet lost.
    appointments.push(appointment(AppointmentStatus::Cancelled, -3));
    appointments.push(appointment(AppointmentStatus::Scheduled, -1));

    let mut slots: Vec<AvailabilitySlot> = (0..6)
        .map(|hour| AvailabilitySlot {
            starts_at: now() - Duration::days(2) + Duration::hours(hour),
            booked: false,
        })
        .collect();
    slots.push(AvailabilitySlot {
        starts_at: now() - Duration::days(1),
        booked: true,
    });
    slots.extend((0..8).map(|hour| AvailabilitySlot {
        starts_at: now() + Duration::hours(hour),
        booked: false,
    }));

    let mut clients = vec![ClientRecord {
        client_id: regular,
        last_visit_at: Some(now() - Duration::days(1)),
    }];
    clients.extend((2..4).map(|n| ClientRecord {
        client_id: ClientId::new(Uuid::from_u128(n)),
        last_visit_at: Some(now() - Duration::days(75)),
    }));

    BookingActivity {
        appointments,
        slots,
        clients,
    }
}

fn login_attempts() -> Vec<LoginAttempt> {
    let attempt = |who: &str, success, minutes_ago| LoginAttempt {
        email: email(who),
        ip_address: Some("203.0.113.5".parse().expect("valid ip")),
        success,
        attempted_at: now() - Duration::minutes(minutes_ago),
    };

    let mut attempts: Vec<LoginAttempt> = (0..5).map(|m| attempt("a@x.com", false, m * 10)).collect();
    attempts.extend((0..4).map(|m| attempt("B@X.com", false, m * 7)));
    attempts.push(attempt("b@x.com", true, 1));
    // Two days old: outside the default window.
    attempts.push(attempt("c@x.com", false, 2 * 24 * 60));
    attempts
}

fn fraud_logs() -> Vec<FraudLog> {
    let log = |ip: &str, status, device: u128, minutes_ago| FraudLog {
        ip_address: ip.parse().expect("valid ip"),
        email: None,
        device_id: Some(DeviceId::new(Uuid::from_u128(device))),
        status,
        created_at: now() - Duration::minutes(minutes_ago),
    };

    vec![
        log("203.0.113.5", FraudStatus::Allowed, 1, 50),
        log("203.0.113.5", FraudStatus::Blocked, 2, 40),
        log("203.0.113.5", FraudStatus::Blocked, 2, 30),
        log("198.51.100.7", FraudStatus::Warning, 3, 20),
        log("198.51.100.7", FraudStatus::Allowed, 3, 10),
    ]
}

fn tenant(plan: Option<PlanTier>) -> TenantFixture {
    TenantFixture {
        plan,
        login_attempts: login_attempts(),
        fraud_logs: fraud_logs(),
        booking: booking(),
    }
}

/// The shared in-memory source.
#[must_use]
pub fn memory_source() -> MemorySource {
    MemorySource::default()
        .with_tenant(growth_tenant(), tenant(Some(PlanTier::Growth)))
        .with_tenant(start_tenant(), tenant(Some(PlanTier::Start)))
        .with_tenant(unsubscribed_tenant(), tenant(None))
}

/// A source whose every read fails.
#[derive(Debug, Default)]
pub struct FailingSource;

impl FailingSource {
    fn fail<T: Send + 'static>() -> BoxFuture<'static, Result<T, SourceError>> {
        future::ready(Err(SourceError::Unavailable("connection refused".to_string()))).boxed()
    }
}

impl AnalyticsSource for FailingSource {
    fn ping(&self) -> BoxFuture<'_, Result<(), SourceError>> {
        Self::fail()
    }

    fn plan_tier(&self, _: TenantId) -> BoxFuture<'_, Result<Option<PlanTier>, SourceError>> {
        Self::fail()
    }

    fn login_attempts(
        &self,
        _: TenantId,
        _: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<LoginAttempt>, SourceError>> {
        Self::fail()
    }

    fn fraud_logs(
        &self,
        _: TenantId,
        _: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<FraudLog>, SourceError>> {
        Self::fail()
    }

    fn booking_activity(
        &self,
        _: TenantId,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<BookingActivity, SourceError>> {
        Self::fail()
    }
}

/// The dashboard router with a fixed clock.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// App over [`memory_source`] with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(Arc::new(memory_source()), AnalyticsPolicy::default())
    }

    #[must_use]
    pub fn with_source(source: Arc<dyn AnalyticsSource>, policy: AnalyticsPolicy) -> Self {
        let state = AppState::with_clock(
            source,
            policy,
            StdDuration::from_secs(60),
            Arc::new(FixedClock(now())),
        );
        Self {
            router: chairside_dashboard::app(state),
        }
    }

    /// Send a GET and return status and raw body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn get_raw(&self, uri: &str) -> (StatusCode, Bytes) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        (status, body)
    }

    /// Send a GET and parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get_raw(uri).await;
        let json = serde_json::from_slice(&body)
            .unwrap_or_else(|e| panic!("{uri} returned non-JSON body ({e}): {body:?}"));
        (status, json)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
