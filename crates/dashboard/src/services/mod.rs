//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `analytics` - Gated analytics views computed from an `AnalyticsSource`
//! - `plans` - Cached subscription tier lookup

pub mod analytics;
pub mod plans;

pub use analytics::{
    AnalyticsService, CategoryLoss, ClientRiskReport, FeatureReport, FraudReport, Gated,
    GrowthReport, LoginReport, MAX_MONITOR_WINDOW, RecoveryEstimate, TenantReport,
};
pub use plans::PlanResolver;
