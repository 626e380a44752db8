//! Analytics policy commands.
//!
//! # Usage
//!
//! ```bash
//! # Check a policy file before deploying it
//! cs-cli policy validate deploy/policy.yaml
//!
//! # Print the effective policy (DASHBOARD_POLICY_PATH or the built-in default)
//! cs-cli policy show
//! ```

use std::path::{Path, PathBuf};

use chairside_core::{AnalyticsError, AnalyticsPolicy};
use chairside_dashboard::{ConfigError, config::load_policy};
use thiserror::Error;

/// Errors that can occur during policy operations.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("Cannot render policy: {0}")]
    Render(#[from] AnalyticsError),
}

/// Load and validate a policy file.
///
/// # Errors
///
/// Returns `PolicyError::Load` if the file is unreadable or invalid.
pub fn validate(path: &Path) -> Result<AnalyticsPolicy, PolicyError> {
    let policy = load_policy(path)?;
    tracing::info!(
        path = %path.display(),
        version = policy.version,
        restricted_features = policy.plan_features.start.len(),
        "Policy is valid"
    );
    Ok(policy)
}

/// Render the effective policy as YAML.
///
/// Uses `path` if given, then `DASHBOARD_POLICY_PATH`, then the built-in policy.
///
/// # Errors
///
/// Returns `PolicyError` if the chosen file is invalid.
pub fn show(path: Option<&Path>) -> Result<String, PolicyError> {
    dotenvy::dotenv().ok();

    let configured = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("DASHBOARD_POLICY_PATH").ok().map(PathBuf::from));

    let policy = match configured {
        Some(path) => load_policy(&path)?,
        None => AnalyticsPolicy::default(),
    };
    Ok(policy.to_yaml()?)
}
