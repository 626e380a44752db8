//! `PostgreSQL` implementation of [`AnalyticsSource`].
//!
//! Queries are checked at runtime (`query_as::<_, Row>`) so the crate builds
//! without a live database. Enum-like columns are stored as text and parsed
//! on the way out; a value that does not parse is reported as data corruption
//! rather than skipped.

use std::net::IpAddr;

use chairside_core::{
    Appointment, AppointmentStatus, AvailabilitySlot, BookingActivity, ClientId, ClientRecord,
    DeviceId, Email, FraudLog, FraudStatus, LoginAttempt, Money, PlanTier, TenantId,
};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::RepositoryError;
use crate::source::{AnalyticsSource, SourceError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    plan: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LoginAttemptRow {
    email: String,
    ip_address: Option<String>,
    success: bool,
    attempted_at: DateTime<Utc>,
}

impl TryFrom<LoginAttemptRow> for LoginAttempt {
    type Error = RepositoryError;

    fn try_from(row: LoginAttemptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            email: parse_email(&row.email)?,
            ip_address: row.ip_address.as_deref().map(parse_ip).transpose()?,
            success: row.success,
            attempted_at: row.attempted_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FraudLogRow {
    ip_address: String,
    email: Option<String>,
    device_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FraudLogRow> for FraudLog {
    type Error = RepositoryError;

    fn try_from(row: FraudLogRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<FraudStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid fraud status in database: {e}"))
        })?;

        Ok(Self {
            ip_address: parse_ip(&row.ip_address)?,
            email: row.email.as_deref().map(parse_email).transpose()?,
            device_id: row.device_id.map(DeviceId::new),
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    client_id: Uuid,
    status: String,
    price: Decimal,
    scheduled_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = RepositoryError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AppointmentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid appointment status in database: {e}"))
        })?;
        let price = Money::new(row.price);
        if price.is_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative appointment price in database: {price}"
            )));
        }

        Ok(Self {
            client_id: ClientId::new(row.client_id),
            status,
            price,
            scheduled_at: row.scheduled_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    starts_at: DateTime<Utc>,
    booked: bool,
}

impl From<SlotRow> for AvailabilitySlot {
    fn from(row: SlotRow) -> Self {
        Self {
            starts_at: row.starts_at,
            booked: row.booked,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    last_visit_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for ClientRecord {
    fn from(row: ClientRow) -> Self {
        Self {
            client_id: ClientId::new(row.id),
            last_visit_at: row.last_visit_at,
        }
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

fn parse_ip(raw: &str) -> Result<IpAddr, RepositoryError> {
    raw.trim().parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid IP address in database: {raw}: {e}"))
    })
}

// =============================================================================
// Source
// =============================================================================

/// Reads analytics events from `PostgreSQL`.
///
/// Cloning is cheap; the pool is shared.
#[derive(Debug, Clone)]
pub struct PgAnalyticsSource {
    pool: PgPool,
}

impl PgAnalyticsSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for shutdown.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn check_connection(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_plan_tier(&self, tenant: TenantId) -> Result<Option<PlanTier>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT plan
            FROM analytics.subscription
            WHERE tenant_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .bind(tenant.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            r.plan.parse::<PlanTier>().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid plan in database: {e}"))
            })
        })
        .transpose()
    }

    #[instrument(skip(self))]
    async fn fetch_login_attempts(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, RepositoryError> {
        let rows = sqlx::query_as::<_, LoginAttemptRow>(
            r"
            SELECT email, ip_address, success, attempted_at
            FROM analytics.login_attempt
            WHERE tenant_id = $1 AND attempted_at >= $2
            ORDER BY attempted_at
            ",
        )
        .bind(tenant.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self))]
    async fn fetch_fraud_logs(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> Result<Vec<FraudLog>, RepositoryError> {
        let rows = sqlx::query_as::<_, FraudLogRow>(
            r"
            SELECT ip_address, email, device_id, status, created_at
            FROM analytics.registration_check
            WHERE tenant_id = $1 AND created_at >= $2
            ORDER BY created_at
            ",
        )
        .bind(tenant.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self))]
    async fn fetch_booking_activity(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<BookingActivity, RepositoryError> {
        let appointments = sqlx::query_as::<_, AppointmentRow>(
            r"
            SELECT client_id, status, price, scheduled_at
            FROM analytics.appointment
            WHERE tenant_id = $1 AND scheduled_at >= $2 AND scheduled_at < $3
            ",
        )
        .bind(tenant.as_uuid())
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool);

        let slots = sqlx::query_as::<_, SlotRow>(
            r"
            SELECT starts_at, booked
            FROM analytics.availability_slot
            WHERE tenant_id = $1 AND starts_at >= $2 AND starts_at < $3
            ",
        )
        .bind(tenant.as_uuid())
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool);

        // Last visit is the latest completed appointment before `until`, over all time.
        let clients = sqlx::query_as::<_, ClientRow>(
            r"
            SELECT c.id,
                   MAX(a.scheduled_at) FILTER (
                       WHERE a.status = 'completed' AND a.scheduled_at < $2
                   ) AS last_visit_at
            FROM analytics.client c
            LEFT JOIN analytics.appointment a
                   ON a.tenant_id = c.tenant_id AND a.client_id = c.id
            WHERE c.tenant_id = $1
            GROUP BY c.id
            ",
        )
        .bind(tenant.as_uuid())
        .bind(until)
        .fetch_all(&self.pool);

        let (appointments, slots, clients) = tokio::try_join!(appointments, slots, clients)?;

        Ok(BookingActivity {
            appointments: appointments
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            slots: slots.into_iter().map(Into::into).collect(),
            clients: clients.into_iter().map(Into::into).collect(),
        })
    }
}

impl AnalyticsSource for PgAnalyticsSource {
    fn ping(&self) -> BoxFuture<'_, Result<(), SourceError>> {
        self.check_connection().map_err(SourceError::from).boxed()
    }

    fn plan_tier(&self, tenant: TenantId) -> BoxFuture<'_, Result<Option<PlanTier>, SourceError>> {
        self.fetch_plan_tier(tenant).map_err(SourceError::from).boxed()
    }

    fn login_attempts(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<LoginAttempt>, SourceError>> {
        self.fetch_login_attempts(tenant, since)
            .map_err(SourceError::from)
            .boxed()
    }

    fn fraud_logs(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<FraudLog>, SourceError>> {
        self.fetch_fraud_logs(tenant, since)
            .map_err(SourceError::from)
            .boxed()
    }

    fn booking_activity(
        &self,
        tenant: TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<BookingActivity, SourceError>> {
        self.fetch_booking_activity(tenant, since, until)
            .map_err(SourceError::from)
            .boxed()
    }
}
