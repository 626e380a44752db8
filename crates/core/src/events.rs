//! Raw event records consumed by the aggregators.
//!
//! All of these are created outside the analytics pipeline (by the
//! authentication boundary, the registration fraud check, or the booking
//! calendar) and are only ever read here.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppointmentStatus, ClientId, DeviceId, Email, FraudStatus, Money};

/// An event with a single point in time used for windowing.
pub trait Timestamped {
    /// When the event happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Iterate over the events at or after `window_start`.
pub fn within_window<T: Timestamped>(
    events: &[T],
    window_start: DateTime<Utc>,
) -> impl Iterator<Item = &T> {
    events
        .iter()
        .filter(move |event| event.occurred_at() >= window_start)
}

/// Iterate over the events in `[window_start, window_end)`.
///
/// Calendars hold future availability and appointments; growth metrics only
/// count what has already happened.
pub fn within_range<T: Timestamped>(
    events: &[T],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> impl Iterator<Item = &T> {
    within_window(events, window_start).filter(move |event| event.occurred_at() < window_end)
}

/// A single sign-in attempt recorded by the authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttempt {
    pub email: Email,
    #[serde(default)]
    pub ip_address: Option<IpAddr>,
    pub success: bool,
    pub attempted_at: DateTime<Utc>,
}

impl Timestamped for LoginAttempt {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }
}

/// A registration attempt with the status assigned by the upstream fraud check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudLog {
    pub ip_address: IpAddr,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    pub status: FraudStatus,
    pub created_at: DateTime<Utc>,
}

impl Timestamped for FraudLog {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub client_id: ClientId,
    pub status: AppointmentStatus,
    pub price: Money,
    pub scheduled_at: DateTime<Utc>,
}

impl Timestamped for Appointment {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }
}

/// A bookable slot in a barber's availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub starts_at: DateTime<Utc>,
    pub booked: bool,
}

impl Timestamped for AvailabilitySlot {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.starts_at
    }
}

/// A customer and their most recent completed visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub client_id: ClientId,
    #[serde(default)]
    pub last_visit_at: Option<DateTime<Utc>>,
}

/// Everything the booking calendar knows about one tenant for a window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingActivity {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub slots: Vec<AvailabilitySlot>,
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
}
