//! Error taxonomy for the analytics pipeline.

use thiserror::Error;

/// Errors produced by the analytics pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    /// A metric value is malformed or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The raw events for an aggregation could not be read.
    ///
    /// No partial aggregate is ever returned alongside this error.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A policy table is missing a key or holds an out-of-range value.
    ///
    /// Raised while loading configuration; not recoverable per call.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for [`AnalyticsError`].
pub type Result<T> = std::result::Result<T, AnalyticsError>;
