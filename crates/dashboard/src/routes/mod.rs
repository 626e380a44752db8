//! HTTP route handlers for the dashboard API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Data source reachable
//!
//! # Tenant analytics (JSON)
//! GET  /api/tenants/{id}/features               - Visibility of every feature
//! GET  /api/tenants/{id}/growth-opportunity     - Metrics and lost revenue (gated)
//! GET  /api/tenants/{id}/recovery-estimate      - ?category=&lost_value= (gated)
//! GET  /api/tenants/{id}/login-stats            - ?window_hours= stats, daily series, identities
//! GET  /api/tenants/{id}/fraud-stats            - ?window_hours= per-IP stats and totals
//! GET  /api/tenants/{id}/client-risk            - Per-client churn risk (gated)
//! ```

pub mod health;
pub mod tenants;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Route table without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/tenants/{id}/features", get(tenants::features))
        .route(
            "/api/tenants/{id}/growth-opportunity",
            get(tenants::growth_opportunity),
        )
        .route(
            "/api/tenants/{id}/recovery-estimate",
            get(tenants::recovery_estimate),
        )
        .route("/api/tenants/{id}/login-stats", get(tenants::login_stats))
        .route("/api/tenants/{id}/fraud-stats", get(tenants::fraud_stats))
        .route("/api/tenants/{id}/client-risk", get(tenants::client_risk))
}

/// The full application: routes, request IDs and request tracing.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
