//! Database operations for the analytics `PostgreSQL` schema.
//!
//! # Tables
//!
//! All tables live in the `analytics` schema and carry a `tenant_id`.
//!
//! - `subscription` - Current plan per tenant (`plan` is `start` or `growth`)
//! - `login_attempt` - One row per sign-in attempt
//! - `registration_check` - Registration attempts with their fraud status
//! - `appointment` - Booked appointments with status and price
//! - `availability_slot` - Bookable slots and whether they were taken
//! - `client` - Customers of the shop
//!
//! The analytics service only reads. Rows are written by the booking,
//! authentication and registration services.

pub mod analytics;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::PgAnalyticsSource;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
