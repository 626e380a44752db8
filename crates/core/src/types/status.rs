//! Status enums for tenants, appointments and fraud records.
//!
//! These arrive from external systems (the subscription boundary, the booking
//! calendar, the registration fraud check) and are read-only to the analytics
//! pipeline. Each one round-trips through its `snake_case` name so database
//! text columns and JSON payloads share one spelling.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error for a status name that does not match any known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownStatus {
    /// Which status enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! impl_status_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the canonical `snake_case` name.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Subscription plan of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// Entry plan; growth analytics are shown as an upgrade preview.
    #[default]
    Start,
    /// Full plan; everything is visible.
    Growth,
}

impl_status_names!(PlanTier, "plan tier", {
    Start => "start",
    Growth => "growth",
});

/// Whether the tenant's plan is known yet.
///
/// Presentation callers hold `Loading` while the subscription lookup is in
/// flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tier")]
pub enum PlanStatus {
    Loading,
    Resolved(PlanTier),
}

impl From<PlanTier> for PlanStatus {
    fn from(tier: PlanTier) -> Self {
        Self::Resolved(tier)
    }
}

impl From<Option<PlanTier>> for PlanStatus {
    fn from(tier: Option<PlanTier>) -> Self {
        tier.map_or(Self::Loading, Self::Resolved)
    }
}

/// Outcome assigned to a registration attempt by the upstream fraud check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    Allowed,
    Blocked,
    Warning,
}

impl_status_names!(FraudStatus, "fraud status", {
    Allowed => "allowed",
    Blocked => "blocked",
    Warning => "warning",
});

/// Lifecycle state of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    NoShow,
    Cancelled,
}

impl_status_names!(AppointmentStatus, "appointment status", {
    Scheduled => "scheduled",
    Completed => "completed",
    NoShow => "no_show",
    Cancelled => "cancelled",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::NoShow,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_status() {
        let err = "suspended".parse::<FraudStatus>().unwrap_err();
        assert_eq!(err.kind, "fraud status");
        assert_eq!(err.to_string(), "unknown fraud status value: \"suspended\"");
    }

    #[test]
    fn test_plan_status_from_option() {
        assert_eq!(PlanStatus::from(None), PlanStatus::Loading);
        assert_eq!(
            PlanStatus::from(Some(PlanTier::Growth)),
            PlanStatus::Resolved(PlanTier::Growth)
        );
    }

    #[test]
    fn test_plan_status_serde_shape() {
        let json = serde_json::to_string(&PlanStatus::Resolved(PlanTier::Start)).unwrap();
        assert_eq!(json, r#"{"state":"resolved","tier":"start"}"#);
        let json = serde_json::to_string(&PlanStatus::Loading).unwrap();
        assert_eq!(json, r#"{"state":"loading"}"#);
    }
}
