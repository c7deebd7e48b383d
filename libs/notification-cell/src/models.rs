use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentStatus};

/// At most this many events are surfaced per recipient.
pub const NOTIFICATION_LIMIT: usize = 5;

/// A status change on one appointment, as shown to its patient. Two events
/// with the same `appointment_id` describe the same notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub appointment_id: Uuid,
    pub status: AppointmentStatus,
    pub observed_at: DateTime<Utc>,
    pub date: NaiveDate,
    #[serde(with = "appointment_cell::services::validation::hhmm")]
    pub time: NaiveTime,
    pub department: String,
    pub doctor_id: Uuid,
}

impl From<&Appointment> for NotificationEvent {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            status: appointment.status,
            observed_at: appointment.updated_at,
            date: appointment.date,
            time: appointment.time,
            department: appointment.department.clone(),
            doctor_id: appointment.doctor_id,
        }
    }
}

/// Appointment ids a recipient has dismissed. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcknowledgedSet(BTreeSet<Uuid>);

impl AcknowledgedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, appointment_id: &Uuid) -> bool {
        self.0.contains(appointment_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.0.iter()
    }

    pub(crate) fn insert(&mut self, appointment_id: Uuid) -> bool {
        self.0.insert(appointment_id)
    }
}

impl FromIterator<Uuid> for AcknowledgedSet {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What one poll tick hands to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollUpdate {
    pub recipient: String,
    /// Everything currently unacknowledged, capped and ordered.
    pub unread: Vec<NotificationEvent>,
    /// The part of `unread` not surfaced by an earlier tick of the same poller.
    pub fresh: Vec<NotificationEvent>,
    pub polled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    #[serde(default)]
    pub appointment_ids: Vec<Uuid>,
    #[serde(default)]
    pub all: bool,
}
