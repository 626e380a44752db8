//! Per-tenant analytics handlers.
//!
//! Every handler resolves the tenant from the path, reads "now" from the
//! state's clock and returns the service's JSON view.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chairside_core::{LOGIN_STATS_WINDOW, LossCategory, Money, TenantId};
use chrono::Duration;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::AppError,
    services::{
        ClientRiskReport, FeatureReport, FraudReport, Gated, GrowthReport, LoginReport,
        RecoveryEstimate,
    },
    state::AppState,
};

// =============================================================================
// Query Parameters
// =============================================================================

/// Trailing window for monitoring views.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// Window length in hours (default: 24)
    pub window_hours: Option<u32>,
}

impl WindowQuery {
    fn window(&self) -> Duration {
        self.window_hours
            .map_or(LOGIN_STATS_WINDOW, |hours| Duration::hours(i64::from(hours)))
    }
}

/// Query parameters for a single recovery estimate.
#[derive(Debug, Deserialize)]
pub struct RecoveryQuery {
    pub category: String,
    pub lost_value: Money,
}

fn parse_tenant(raw: &str) -> Result<TenantId, AppError> {
    TenantId::parse(raw).map_err(|e| AppError::BadRequest(format!("invalid tenant id: {e}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/tenants/{id}/features`
#[instrument(skip(state))]
pub async fn features(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<FeatureReport>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    Ok(Json(state.analytics().features(tenant).await?))
}

/// `GET /api/tenants/{id}/growth-opportunity`
#[instrument(skip(state))]
pub async fn growth_opportunity(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Gated<GrowthReport>>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    let report = state
        .analytics()
        .growth_opportunity(tenant, state.now())
        .await?;
    Ok(Json(report))
}

/// `GET /api/tenants/{id}/recovery-estimate?category=&lost_value=`
#[instrument(skip(state))]
pub async fn recovery_estimate(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<RecoveryQuery>,
) -> Result<Json<Gated<RecoveryEstimate>>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    let category = query.category.parse::<LossCategory>()?;
    let estimate = state
        .analytics()
        .recovery_estimate(tenant, category, query.lost_value)
        .await?;
    Ok(Json(estimate))
}

/// `GET /api/tenants/{id}/login-stats?window_hours=`
#[instrument(skip(state))]
pub async fn login_stats(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Gated<LoginReport>>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    let report = state
        .analytics()
        .login_stats(tenant, query.window(), state.now())
        .await?;
    Ok(Json(report))
}

/// `GET /api/tenants/{id}/fraud-stats?window_hours=`
#[instrument(skip(state))]
pub async fn fraud_stats(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Gated<FraudReport>>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    let report = state
        .analytics()
        .fraud_stats(tenant, query.window(), state.now())
        .await?;
    Ok(Json(report))
}

/// `GET /api/tenants/{id}/client-risk`
#[instrument(skip(state))]
pub async fn client_risk(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Gated<ClientRiskReport>>, AppError> {
    let tenant = parse_tenant(&tenant)?;
    let report = state.analytics().client_risk(tenant, state.now()).await?;
    Ok(Json(report))
}
