//! Offline tenant reports from a JSON fixture.
//!
//! # Usage
//!
//! ```bash
//! cs-cli report --fixture shop.json --tenant 6f1c1f4e-3f55-4a7e-9d0f-2b5bb1a3f0c1 \
//!     --now 2026-05-31T12:00:00Z
//! ```
//!
//! The report runs the same gated views as the dashboard API against an
//! in-memory source and prints them as JSON.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chairside_core::{AnalyticsError, AnalyticsPolicy, TenantId};
use chairside_dashboard::services::{AnalyticsService, PlanResolver, TenantReport};
use chairside_dashboard::{ConfigError, MemorySource, SourceError, config::load_policy};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while producing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Cannot read fixture {0}: {1}")]
    Fixture(String, std::io::Error),

    #[error("Invalid tenant id: {0}")]
    InvalidTenant(String),

    #[error("Invalid --now timestamp: {0}")]
    InvalidNow(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Policy(#[from] ConfigError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Cannot render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Inputs for a single report.
#[derive(Debug)]
pub struct ReportArgs<'a> {
    pub fixture: &'a Path,
    pub tenant: &'a str,
    pub now: Option<&'a str>,
    pub policy: Option<&'a Path>,
}

/// Build every view for one tenant.
///
/// # Errors
///
/// Returns `ReportError` if an argument is malformed or a view fails.
pub async fn build(args: &ReportArgs<'_>) -> Result<TenantReport, ReportError> {
    let json = std::fs::read_to_string(args.fixture)
        .map_err(|e| ReportError::Fixture(args.fixture.display().to_string(), e))?;
    let source = Arc::new(MemorySource::from_json(&json)?);

    let tenant =
        TenantId::parse(args.tenant).map_err(|e| ReportError::InvalidTenant(e.to_string()))?;
    let now = match args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| ReportError::InvalidNow(e.to_string()))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let policy = match args.policy {
        Some(path) => load_policy(path)?,
        None => AnalyticsPolicy::default(),
    };

    // One-shot process: the plan cache only needs to outlive this report.
    let plans = PlanResolver::new(source.clone(), Duration::from_secs(60));
    let service = AnalyticsService::new(source, plans, Arc::new(policy));

    tracing::info!(%tenant, %now, "Building tenant report");
    Ok(service.tenant_report(tenant, now).await?)
}

/// Build a report and render it as pretty JSON.
///
/// # Errors
///
/// Same conditions as [`build`].
pub async fn run(args: &ReportArgs<'_>) -> Result<String, ReportError> {
    let report = build(args).await?;
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TENANT: &str = "6f1c1f4e-3f55-4a7e-9d0f-2b5bb1a3f0c1";

    fn write_fixture(plan: &str) -> std::path::PathBuf {
        let json = format!(
            r#"{{
              "tenants": {{
                "{TENANT}": {{
                  "plan": "{plan}",
                  "booking": {{
                    "appointments": [
                      {{ "clientId": "0b9a2a43-33a4-4b4e-8bde-1f3c9d7d4a10", "status": "completed",
                         "price": "80.00", "scheduledAt": "2026-05-30T15:00:00Z" }},
                      {{ "clientId": "0b9a2a43-33a4-4b4e-8bde-1f3c9d7d4a10", "status": "no_show",
                         "price": "80.00", "scheduledAt": "2026-05-20T15:00:00Z" }}
                    ]
                  }}
                }}
              }}
            }}"#
        );
        let path = std::env::temp_dir().join(format!("cs-cli-report-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn test_growth_report_from_fixture() {
        let fixture = write_fixture("growth");
        let args = ReportArgs {
            fixture: &fixture,
            tenant: TENANT,
            now: Some("2026-05-31T12:00:00Z"),
            policy: None,
        };

        let report = build(&args).await.unwrap();
        let growth = report.growth.data.unwrap();
        assert_eq!(growth.total_missed_revenue, chairside_core::Money::from_major(80));
        assert!(run(&args).await.unwrap().contains("\"generatedAt\""));

        std::fs::remove_file(fixture).unwrap();
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let fixture = write_fixture("start");
        let bad_tenant = ReportArgs {
            fixture: &fixture,
            tenant: "shop-1",
            now: None,
            policy: None,
        };
        assert!(matches!(
            build(&bad_tenant).await,
            Err(ReportError::InvalidTenant(_))
        ));

        let bad_now = ReportArgs {
            tenant: TENANT,
            now: Some("yesterday"),
            ..bad_tenant
        };
        assert!(matches!(build(&bad_now).await, Err(ReportError::InvalidNow(_))));

        std::fs::remove_file(fixture).unwrap();
    }
}
