//! Chairside Core - domain types and the analytics pipeline.
//!
//! This crate is shared by every Chairside component:
//! - `dashboard` - JSON service behind the tenant dashboard
//! - `cli` - Command-line tools for policy files and offline reports
//!
//! # Architecture
//!
//! The core crate contains no I/O: no database access, no HTTP clients, no
//! clock reads. Callers fetch raw events and pass in "now"; every function
//! here is a deterministic reduction over its arguments.
//!
//! ```text
//! raw events ──► aggregate ──► opportunity / risk ──► gate ──► presentation
//! ```
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, statuses and devices
//! - [`events`] - Raw records read from the data-access boundary
//! - [`aggregate`] - Windowed reductions into metrics and stats
//! - [`opportunity`] - Lost and recoverable revenue estimation
//! - [`risk`] - Threshold rules for identities and clients
//! - [`gate`] - Plan-based feature visibility
//! - [`policy`] - Versioned policy tables
//! - [`format`] - Money display

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod error;
pub mod events;
pub mod format;
pub mod gate;
pub mod opportunity;
pub mod policy;
pub mod risk;
pub mod types;

pub use aggregate::{
    AppointmentStatusCount, DailyLoginCount, FraudStats, FraudTotals, GROWTH_METRICS_WINDOW,
    LOGIN_STATS_WINDOW, LoginAttemptStats, aggregate_barber_metrics, aggregate_fraud_stats,
    aggregate_login_attempt_stats, appointment_status_counts, daily_login_counts,
    summarize_fraud_stats, window_start,
};
pub use error::AnalyticsError;
pub use events::{
    Appointment, AvailabilitySlot, BookingActivity, ClientRecord, FraudLog, LoginAttempt,
    Timestamped, within_range, within_window,
};
pub use format::{CurrencyCode, CurrencyFormat, Locale, format_currency};
pub use gate::{
    FeatureId, PlanFeatureTable, Restriction, Visibility, resolve_all, resolve_feature_visibility,
};
pub use opportunity::{
    BarberMetrics, GrowthOpportunity, LossCategory, RecoveryRateTable,
    calculate_growth_opportunity, get_recovery_estimate,
};
pub use policy::AnalyticsPolicy;
pub use risk::{
    BLOCK_THRESHOLD, ClientRisk, ClientRiskLevel, IdentityRisk, IdentityRiskLevel,
    WARNING_THRESHOLD, classify_identities, score_client_risk,
};
pub use types::*;
