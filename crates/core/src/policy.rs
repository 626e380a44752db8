//! Versioned policy tables for the analytics pipeline.
//!
//! Recovery rates, plan restrictions and display currency are data, not code.
//! A policy document looks like:
//!
//! ```yaml
//! version: 3
//! recovery_rates:
//!   no_shows: "0.6"
//!   cancellations: "0.5"
//!   empty_slots: "0.4"
//!   inactive_clients: "0.3"
//! plan_features:
//!   start:
//!     growth_opportunities: blurred_preview
//!     marketing_posts: locked
//! currency:
//!   currency: BRL
//!   locale: pt-BR
//! ```
//!
//! Every section is required and unknown keys are rejected, so a typo fails at
//! load time instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::format::CurrencyFormat;
use crate::gate::PlanFeatureTable;
use crate::opportunity::RecoveryRateTable;

/// Version number carried by the built-in policy.
pub const DEFAULT_POLICY_VERSION: u32 = 1;

/// The complete set of tunable analytics policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsPolicy {
    pub version: u32,
    pub recovery_rates: RecoveryRateTable,
    pub plan_features: PlanFeatureTable,
    pub currency: CurrencyFormat,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION,
            recovery_rates: RecoveryRateTable::default(),
            plan_features: PlanFeatureTable::default(),
            currency: CurrencyFormat::default(),
        }
    }
}

impl AnalyticsPolicy {
    /// Parse and validate a YAML policy document.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Configuration`] if the document is malformed,
    /// misses a key, or holds an out-of-range value.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let policy: Self = serde_yaml::from_str(source)
            .map_err(|e| AnalyticsError::Configuration(format!("invalid policy YAML: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parse and validate a JSON policy document.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AnalyticsPolicy::from_yaml`].
    pub fn from_json(source: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(source)
            .map_err(|e| AnalyticsError::Configuration(format!("invalid policy JSON: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check every table.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalyticsError::Configuration`] found.
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(AnalyticsError::Configuration(
                "policy version must be at least 1".to_owned(),
            ));
        }
        self.recovery_rates.validate()?;
        self.plan_features.validate()
    }

    /// Render the policy as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Configuration`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AnalyticsError::Configuration(format!("cannot render policy: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::format::{CurrencyCode, Locale};
    use crate::gate::{FeatureId, Restriction};

    const DOCUMENT: &str = r#"
version: 3
recovery_rates:
  no_shows: "0.7"
  cancellations: "0.5"
  empty_slots: "0.4"
  inactive_clients: "0.25"
plan_features:
  start:
    growth_opportunities: blurred_preview
    marketing_posts: locked
currency:
  currency: USD
  locale: en-US
"#;

    #[test]
    fn test_parse_yaml_document() {
        let policy = AnalyticsPolicy::from_yaml(DOCUMENT).unwrap();
        assert_eq!(policy.version, 3);
        assert_eq!(policy.recovery_rates.no_shows, Decimal::new(7, 1));
        assert_eq!(policy.recovery_rates.inactive_clients, Decimal::new(25, 2));
        assert_eq!(
            policy.plan_features.start.get(&FeatureId::MarketingPosts),
            Some(&Restriction::Locked)
        );
        assert_eq!(policy.currency, CurrencyFormat::new(CurrencyCode::USD, Locale::EnUs));
    }

    #[test]
    fn test_missing_rate_is_configuration_error() {
        let broken = DOCUMENT.replace("  empty_slots: \"0.4\"\n", "");
        let err = AnalyticsPolicy::from_yaml(&broken).unwrap_err();
        assert!(matches!(err, AnalyticsError::Configuration(_)));
        assert!(err.to_string().contains("empty_slots"));
    }

    #[test]
    fn test_out_of_range_rate_is_rejected() {
        let broken = DOCUMENT.replace("\"0.7\"", "\"1.5\"");
        assert!(matches!(
            AnalyticsPolicy::from_yaml(&broken),
            Err(AnalyticsError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_round_trips_through_yaml_and_json() {
        let policy = AnalyticsPolicy::default();
        let yaml = policy.to_yaml().unwrap();
        assert_eq!(AnalyticsPolicy::from_yaml(&yaml).unwrap(), policy);

        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(AnalyticsPolicy::from_json(&json).unwrap(), policy);
    }

    #[test]
    fn test_version_zero_rejected() {
        let broken = DOCUMENT.replace("version: 3", "version: 0");
        assert!(AnalyticsPolicy::from_yaml(&broken).is_err());
    }
}
