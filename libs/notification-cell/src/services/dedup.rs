use std::cmp::Ordering;

use uuid::Uuid;

use appointment_cell::Appointment;

use crate::models::{AcknowledgedSet, NotificationEvent, NOTIFICATION_LIMIT};

/// Unacknowledged status changes, newest appointment date first with ties
/// broken by id, capped at [`NOTIFICATION_LIMIT`]. Pending appointments have
/// nothing to report yet.
pub fn diff(appointments: &[Appointment], acknowledged: &AcknowledgedSet) -> Vec<NotificationEvent> {
    let mut events: Vec<NotificationEvent> = appointments
        .iter()
        .filter(|appointment| !appointment.is_pending())
        .filter(|appointment| !acknowledged.contains(&appointment.id))
        .map(NotificationEvent::from)
        .collect();

    events.sort_by(newest_first);
    events.dedup_by_key(|event| event.appointment_id);
    events.truncate(NOTIFICATION_LIMIT);
    events
}

pub fn acknowledge(appointment_id: Uuid, set: &AcknowledgedSet) -> AcknowledgedSet {
    acknowledge_all([appointment_id], set)
}

pub fn acknowledge_all<I>(appointment_ids: I, set: &AcknowledgedSet) -> AcknowledgedSet
where
    I: IntoIterator<Item = Uuid>,
{
    let mut next = set.clone();
    for appointment_id in appointment_ids {
        next.insert(appointment_id);
    }
    next
}

fn newest_first(a: &NotificationEvent, b: &NotificationEvent) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.appointment_id.cmp(&b.appointment_id))
}
