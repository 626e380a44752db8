//! Chairside Dashboard - analytics service behind the tenant dashboard.
//!
//! Serves growth-opportunity, login, fraud and client-risk views as JSON.
//! Restricted figures are withheld server-side according to the tenant's
//! plan; the dashboard only decides how to draw the preview.
//!
//! # Architecture
//!
//! - Axum web framework
//! - [`source::AnalyticsSource`] as the data-access boundary
//! - `PostgreSQL` implementation in [`db`], in-memory fixtures in [`source`]
//! - `chairside_core` for every calculation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod source;
pub mod state;

pub use config::{ConfigError, DashboardConfig};
pub use error::AppError;
pub use routes::app;
pub use services::AnalyticsService;
pub use source::{AnalyticsSource, Fixture, MemorySource, SourceError, TenantFixture};
pub use state::{AppState, Clock, FixedClock, SystemClock};
