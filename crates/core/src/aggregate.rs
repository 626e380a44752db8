//! Reductions from raw event streams to the shapes the calculators consume.
//!
//! Every function here is pure: the caller supplies the events and the window
//! start, and the same input always produces the same output. Grouped outputs
//! are sparse (a key with no events produces no record) and ordered by key so
//! that repeated runs are identical.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::events::{BookingActivity, FraudLog, LoginAttempt, within_range, within_window};
use crate::opportunity::BarberMetrics;
use crate::risk::BLOCK_THRESHOLD;
use crate::types::{AppointmentStatus, Email, FraudStatus, Money};

/// Trailing window for login statistics.
pub const LOGIN_STATS_WINDOW: Duration = Duration::hours(24);

/// Trailing window for growth metrics.
pub const GROWTH_METRICS_WINDOW: Duration = Duration::days(30);

/// Start of a trailing window ending at `now`.
#[must_use]
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now - window
}

// =============================================================================
// Login attempts
// =============================================================================

/// Login activity over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttemptStats {
    pub total_attempts: u32,
    pub successful_logins: u32,
    pub failed_attempts: u32,
    /// Distinct emails with at least [`BLOCK_THRESHOLD`] failures in the window.
    pub blocked_accounts: u32,
    pub unique_emails: u32,
}

/// One day of login activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLoginCount {
    pub date: NaiveDate,
    pub total_attempts: u32,
    pub successful_logins: u32,
    pub failed_attempts: u32,
}

/// Failed attempt count per email within the window.
pub(crate) fn failures_by_email(
    attempts: &[LoginAttempt],
    window_start: DateTime<Utc>,
) -> BTreeMap<&Email, u32> {
    let mut failures = BTreeMap::new();
    for attempt in within_window(attempts, window_start).filter(|a| !a.success) {
        *failures.entry(&attempt.email).or_insert(0) += 1;
    }
    failures
}

/// Aggregate login attempts at or after `window_start`.
#[must_use]
pub fn aggregate_login_attempt_stats(
    attempts: &[LoginAttempt],
    window_start: DateTime<Utc>,
) -> LoginAttemptStats {
    let mut stats = LoginAttemptStats::default();
    let mut emails = BTreeSet::new();

    for attempt in within_window(attempts, window_start) {
        stats.total_attempts += 1;
        if attempt.success {
            stats.successful_logins += 1;
        } else {
            stats.failed_attempts += 1;
        }
        emails.insert(&attempt.email);
    }

    stats.unique_emails = count_u32(emails.len());
    stats.blocked_accounts = count_u32(
        failures_by_email(attempts, window_start)
            .values()
            .filter(|&&failed| failed >= BLOCK_THRESHOLD)
            .count(),
    );
    stats
}

/// Login activity grouped by UTC calendar day, oldest first.
#[must_use]
pub fn daily_login_counts(
    attempts: &[LoginAttempt],
    window_start: DateTime<Utc>,
) -> Vec<DailyLoginCount> {
    let mut days: BTreeMap<NaiveDate, DailyLoginCount> = BTreeMap::new();
    for attempt in within_window(attempts, window_start) {
        let date = attempt.attempted_at.date_naive();
        let day = days.entry(date).or_insert(DailyLoginCount {
            date,
            total_attempts: 0,
            successful_logins: 0,
            failed_attempts: 0,
        });
        day.total_attempts += 1;
        if attempt.success {
            day.successful_logins += 1;
        } else {
            day.failed_attempts += 1;
        }
    }
    days.into_values().collect()
}

// =============================================================================
// Fraud logs
// =============================================================================

/// Registration activity from a single IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudStats {
    pub ip_address: IpAddr,
    pub total_attempts: u32,
    /// Attempts the upstream check let through.
    pub successful_registrations: u32,
    pub blocked_attempts: u32,
    pub warnings: u32,
    pub unique_devices: u32,
    pub first_attempt: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
}

/// Totals across every IP in a fraud report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudTotals {
    pub unique_ips: u32,
    pub total_attempts: u32,
    pub successful_registrations: u32,
    pub blocked_attempts: u32,
    pub warnings: u32,
    /// IPs with at least one blocked attempt.
    pub ips_with_blocks: u32,
}

/// Aggregate fraud logs into one record per IP address.
///
/// Statuses are tallied as assigned upstream; nothing is re-derived here.
/// Records are ordered by total attempts (descending), then IP address.
#[must_use]
pub fn aggregate_fraud_stats(logs: &[FraudLog]) -> Vec<FraudStats> {
    let mut by_ip: BTreeMap<IpAddr, (FraudStats, BTreeSet<_>)> = BTreeMap::new();

    for log in logs {
        let (stats, devices) = by_ip.entry(log.ip_address).or_insert_with(|| {
            (
                FraudStats {
                    ip_address: log.ip_address,
                    total_attempts: 0,
                    successful_registrations: 0,
                    blocked_attempts: 0,
                    warnings: 0,
                    unique_devices: 0,
                    first_attempt: log.created_at,
                    last_attempt: log.created_at,
                },
                BTreeSet::new(),
            )
        });

        stats.total_attempts += 1;
        match log.status {
            FraudStatus::Allowed => stats.successful_registrations += 1,
            FraudStatus::Blocked => stats.blocked_attempts += 1,
            FraudStatus::Warning => stats.warnings += 1,
        }
        stats.first_attempt = stats.first_attempt.min(log.created_at);
        stats.last_attempt = stats.last_attempt.max(log.created_at);
        if let Some(device) = log.device_id {
            devices.insert(device);
        }
    }

    let mut records: Vec<FraudStats> = by_ip
        .into_values()
        .map(|(mut stats, devices)| {
            stats.unique_devices = count_u32(devices.len());
            stats
        })
        .collect();
    records.sort_by(|a, b| {
        b.total_attempts
            .cmp(&a.total_attempts)
            .then_with(|| a.ip_address.cmp(&b.ip_address))
    });
    records
}

/// Sum per-IP records into report totals.
#[must_use]
pub fn summarize_fraud_stats(stats: &[FraudStats]) -> FraudTotals {
    stats.iter().fold(
        FraudTotals {
            unique_ips: count_u32(stats.len()),
            ..FraudTotals::default()
        },
        |mut totals, ip| {
            totals.total_attempts += ip.total_attempts;
            totals.successful_registrations += ip.successful_registrations;
            totals.blocked_attempts += ip.blocked_attempts;
            totals.warnings += ip.warnings;
            if ip.blocked_attempts > 0 {
                totals.ips_with_blocks += 1;
            }
            totals
        },
    )
}

// =============================================================================
// Booking activity
// =============================================================================

/// Number of appointments with a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusCount {
    pub status: AppointmentStatus,
    pub count: u32,
}

/// Appointments in `[window_start, window_end)` grouped by status.
#[must_use]
pub fn appointment_status_counts(
    activity: &BookingActivity,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<AppointmentStatusCount> {
    let mut counts: BTreeMap<AppointmentStatus, u32> = BTreeMap::new();
    for appointment in within_range(&activity.appointments, window_start, window_end) {
        *counts.entry(appointment.status).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(status, count)| AppointmentStatusCount { status, count })
        .collect()
}

/// Derive [`BarberMetrics`] from raw booking records in
/// `[window_start, window_end)`.
///
/// Slots and appointments at or after `window_end` are ignored, so open
/// availability later in the calendar is not counted as lost.
///
/// - The average ticket is the mean price of completed appointments in the
///   window, rounded to cents; zero when there are none.
/// - Empty slots are unbooked availability slots in the window.
/// - Inactive clients have visited at least once, but not since `window_start`.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidInput`] if completed appointment prices
/// overflow when summed, or average to a negative or out-of-range amount.
pub fn aggregate_barber_metrics(
    activity: &BookingActivity,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<BarberMetrics> {
    let mut no_shows = 0;
    let mut cancellations = 0;
    let mut completed = 0u32;
    let mut revenue = Money::ZERO;

    for appointment in within_range(&activity.appointments, window_start, window_end) {
        match appointment.status {
            AppointmentStatus::NoShow => no_shows += 1,
            AppointmentStatus::Cancelled => cancellations += 1,
            AppointmentStatus::Completed => {
                completed += 1;
                revenue = revenue.checked_add(appointment.price).ok_or_else(|| {
                    AnalyticsError::InvalidInput(format!(
                        "completed appointment prices overflow after {completed} appointments"
                    ))
                })?;
            }
            AppointmentStatus::Scheduled => {}
        }
    }

    let avg_ticket = if completed == 0 {
        Money::ZERO
    } else {
        Money::new(
            (revenue.amount() / Decimal::from(completed))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    };

    let empty_slots = count_u32(
        within_range(&activity.slots, window_start, window_end)
            .filter(|slot| !slot.booked)
            .count(),
    );

    let inactive_clients = count_u32(
        activity
            .clients
            .iter()
            .filter(|client| client.last_visit_at.is_some_and(|at| at < window_start))
            .count(),
    );

    BarberMetrics::new(
        avg_ticket,
        no_shows,
        cancellations,
        empty_slots,
        inactive_clients,
    )
}

/// Saturating `usize` to `u32` conversion for counts.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
