//! Threshold rules that turn aggregated counts into risk signals.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::failures_by_email;
use crate::events::{BookingActivity, LoginAttempt, within_range, within_window};
use crate::types::{AppointmentStatus, ClientId, Email};

/// Failed attempts in the window at which an email counts as blocked.
pub const BLOCK_THRESHOLD: u32 = 5;

/// Failed attempts in the window at which an email is flagged.
pub const WARNING_THRESHOLD: u32 = 3;

/// Days without a visit after which a client is drifting away.
pub const CLIENT_MEDIUM_RISK_DAYS: i64 = 30;

/// Days without a visit after which a client is likely lost.
pub const CLIENT_HIGH_RISK_DAYS: i64 = 60;

/// No-shows in the window that make a client high risk on their own.
pub const CLIENT_HIGH_RISK_NO_SHOWS: u32 = 2;

/// Risk bucket for a sign-in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRiskLevel {
    Allowed,
    Warning,
    Blocked,
}

impl IdentityRiskLevel {
    /// Bucket a failed-attempt count.
    #[must_use]
    pub const fn from_failures(failed_attempts: u32) -> Self {
        if failed_attempts >= BLOCK_THRESHOLD {
            Self::Blocked
        } else if failed_attempts >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Allowed
        }
    }
}

/// Failed sign-in summary for one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRisk {
    pub email: Email,
    pub failed_attempts: u32,
    pub last_failed_at: DateTime<Utc>,
    pub level: IdentityRiskLevel,
}

/// Classify every email with at least one failure in the window.
///
/// Each email is judged on its own failures; there is no cross-email
/// correlation. Results are ordered by level (blocked first), then failure
/// count descending, then email.
#[must_use]
pub fn classify_identities(
    attempts: &[LoginAttempt],
    window_start: DateTime<Utc>,
) -> Vec<IdentityRisk> {
    let mut last_failed: BTreeMap<&Email, DateTime<Utc>> = BTreeMap::new();
    for attempt in within_window(attempts, window_start).filter(|a| !a.success) {
        last_failed
            .entry(&attempt.email)
            .and_modify(|at| *at = (*at).max(attempt.attempted_at))
            .or_insert(attempt.attempted_at);
    }

    let mut identities: Vec<IdentityRisk> = failures_by_email(attempts, window_start)
        .into_iter()
        .filter_map(|(email, failed_attempts)| {
            let last_failed_at = *last_failed.get(email)?;
            Some(IdentityRisk {
                email: email.clone(),
                failed_attempts,
                last_failed_at,
                level: IdentityRiskLevel::from_failures(failed_attempts),
            })
        })
        .collect();

    identities.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| b.failed_attempts.cmp(&a.failed_attempts))
            .then_with(|| a.email.cmp(&b.email))
    });
    identities
}

/// Churn risk bucket for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRiskLevel {
    Low,
    Medium,
    High,
}

/// Churn risk assessment for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRisk {
    pub client_id: ClientId,
    /// `None` when the client has never completed a visit.
    pub days_since_last_visit: Option<i64>,
    pub no_shows: u32,
    pub level: ClientRiskLevel,
}

/// Bucket one client from their last visit and recent no-shows.
#[must_use]
pub fn client_risk_level(days_since_last_visit: Option<i64>, no_shows: u32) -> ClientRiskLevel {
    match days_since_last_visit {
        _ if no_shows >= CLIENT_HIGH_RISK_NO_SHOWS => ClientRiskLevel::High,
        Some(days) if days > CLIENT_HIGH_RISK_DAYS => ClientRiskLevel::High,
        Some(days) if days > CLIENT_MEDIUM_RISK_DAYS => ClientRiskLevel::Medium,
        None => ClientRiskLevel::Medium,
        Some(_) if no_shows > 0 => ClientRiskLevel::Medium,
        Some(_) => ClientRiskLevel::Low,
    }
}

/// Score every client of a tenant, highest risk first.
///
/// No-shows are counted over appointments in `[window_start, now)`; days
/// since the last visit are measured against `now`.
#[must_use]
pub fn score_client_risk(
    activity: &BookingActivity,
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<ClientRisk> {
    let mut no_shows: BTreeMap<ClientId, u32> = BTreeMap::new();
    for appointment in within_range(&activity.appointments, window_start, now)
        .filter(|a| a.status == AppointmentStatus::NoShow)
    {
        *no_shows.entry(appointment.client_id).or_insert(0) += 1;
    }

    let mut scores: Vec<ClientRisk> = activity
        .clients
        .iter()
        .map(|client| {
            let days_since_last_visit = client
                .last_visit_at
                .map(|at| (now - at).max(Duration::zero()).num_days());
            let no_shows = no_shows.get(&client.client_id).copied().unwrap_or(0);
            ClientRisk {
                client_id: client.client_id,
                days_since_last_visit,
                no_shows,
                level: client_risk_level(days_since_last_visit, no_shows),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| b.days_since_last_visit.cmp(&a.days_since_last_visit))
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
    scores
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::events::{Appointment, ClientRecord};
    use crate::types::Money;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn failure(email: &str, minutes_ago: i64) -> LoginAttempt {
        LoginAttempt {
            email: Email::parse(email).unwrap(),
            ip_address: None,
            success: false,
            attempted_at: now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_identity_levels_use_inclusive_thresholds() {
        assert_eq!(IdentityRiskLevel::from_failures(0), IdentityRiskLevel::Allowed);
        assert_eq!(IdentityRiskLevel::from_failures(2), IdentityRiskLevel::Allowed);
        assert_eq!(IdentityRiskLevel::from_failures(3), IdentityRiskLevel::Warning);
        assert_eq!(IdentityRiskLevel::from_failures(4), IdentityRiskLevel::Warning);
        assert_eq!(IdentityRiskLevel::from_failures(5), IdentityRiskLevel::Blocked);
    }

    #[test]
    fn test_classify_identities() {
        let mut attempts: Vec<_> = (1..=5).map(|m| failure("a@x.com", m)).collect();
        attempts.extend((1..=3).map(|m| failure("b@x.com", m * 10)));
        attempts.push(failure("c@x.com", 7));

        let identities = classify_identities(&attempts, now() - Duration::hours(24));
        let summary: Vec<_> = identities
            .iter()
            .map(|i| (i.email.as_str(), i.failed_attempts, i.level))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a@x.com", 5, IdentityRiskLevel::Blocked),
                ("b@x.com", 3, IdentityRiskLevel::Warning),
                ("c@x.com", 1, IdentityRiskLevel::Allowed),
            ]
        );
        assert_eq!(identities[0].last_failed_at, now() - Duration::minutes(1));
    }

    #[test]
    fn test_client_risk_rules() {
        assert_eq!(client_risk_level(Some(3), 0), ClientRiskLevel::Low);
        assert_eq!(client_risk_level(Some(3), 1), ClientRiskLevel::Medium);
        assert_eq!(client_risk_level(Some(3), 2), ClientRiskLevel::High);
        assert_eq!(client_risk_level(Some(30), 0), ClientRiskLevel::Low);
        assert_eq!(client_risk_level(Some(31), 0), ClientRiskLevel::Medium);
        assert_eq!(client_risk_level(Some(61), 0), ClientRiskLevel::High);
        assert_eq!(client_risk_level(None, 0), ClientRiskLevel::Medium);
    }

    #[test]
    fn test_score_client_risk_orders_highest_first() {
        let regular = ClientId::new(Uuid::from_u128(1));
        let flaky = ClientId::new(Uuid::from_u128(2));
        let lapsed = ClientId::new(Uuid::from_u128(3));

        let no_show = |client_id| Appointment {
            client_id,
            status: AppointmentStatus::NoShow,
            price: Money::from_major(50),
            scheduled_at: now() - Duration::days(2),
        };
        let activity = BookingActivity {
            appointments: vec![no_show(flaky), no_show(flaky)],
            slots: Vec::new(),
            clients: vec![
                ClientRecord { client_id: regular, last_visit_at: Some(now() - Duration::days(5)) },
                ClientRecord { client_id: flaky, last_visit_at: Some(now() - Duration::days(10)) },
                ClientRecord { client_id: lapsed, last_visit_at: Some(now() - Duration::days(90)) },
            ],
        };

        let scores = score_client_risk(&activity, now() - Duration::days(30), now());
        let order: Vec<_> = scores.iter().map(|s| (s.client_id, s.level)).collect();
        assert_eq!(
            order,
            vec![
                (lapsed, ClientRiskLevel::High),
                (flaky, ClientRiskLevel::High),
                (regular, ClientRiskLevel::Low),
            ]
        );
        assert_eq!(scores[1].no_shows, 2);
        assert_eq!(scores[0].days_since_last_visit, Some(90));
    }
}
