use appointment_cell::Appointment;

use crate::error::NotificationError;

pub(crate) fn validate_recipient(recipient: &str) -> Result<String, NotificationError> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(NotificationError::InvalidRecipient("recipient is required".to_string()));
    }
    Ok(recipient.to_string())
}

/// Form of a recipient used when none of its appointments are known yet.
/// E-mails match case-insensitively, so they are lower-cased.
pub fn normalize_recipient(recipient: &str) -> String {
    let recipient = recipient.trim();
    if recipient.contains('@') {
        recipient.to_ascii_lowercase()
    } else {
        recipient.to_string()
    }
}

/// The key acknowledgements and server-side pollers are stored under.
///
/// A patient can be addressed by id or by any casing of their e-mail; all of
/// those resolve to the patient id found on their appointments. The smallest
/// id wins if an e-mail is shared.
pub fn canonical_recipient(recipient: &str, appointments: &[Appointment]) -> String {
    appointments
        .iter()
        .filter(|appointment| appointment.belongs_to(recipient))
        .map(|appointment| appointment.patient.patient_id.as_str())
        .min()
        .map(str::to_string)
        .unwrap_or_else(|| normalize_recipient(recipient))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    use appointment_cell::{AppointmentStatus, PatientSnapshot};

    use super::*;

    fn booked_by(patient_id: &str, email: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient: PatientSnapshot {
                patient_id: patient_id.to_string(),
                name: "Mara Ilic".to_string(),
                email: email.to_string(),
                phone: None,
                gender: None,
            },
            department: "Neurology".to_string(),
            doctor_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: AppointmentStatus::Accepted,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn every_address_resolves_to_the_patient_id() {
        let appointments = vec![booked_by("patient-9", "Mara.Ilic@example.org")];

        for recipient in ["patient-9", "mara.ilic@example.org", " MARA.ILIC@example.org "] {
            assert_eq!(canonical_recipient(recipient, &appointments), "patient-9");
        }
    }

    #[test]
    fn unknown_recipient_falls_back_to_normalized_form() {
        assert_eq!(canonical_recipient(" Who@Example.org", &[]), "who@example.org");
        assert_eq!(canonical_recipient("Patient-X", &[]), "Patient-X");
    }

    #[test]
    fn shared_email_picks_smallest_id() {
        let appointments = vec![
            booked_by("patient-b", "family@example.org"),
            booked_by("patient-a", "family@example.org"),
        ];
        assert_eq!(canonical_recipient("family@example.org", &appointments), "patient-a");
    }

    #[test]
    fn blank_recipient_is_rejected() {
        assert!(validate_recipient("   ").is_err());
        assert_eq!(validate_recipient(" x ").unwrap(), "x");
    }
}
