// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::DirectoryError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient: PatientSnapshot,
    pub department: String,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "crate::services::validation::hhmm")]
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_pending(&self) -> bool {
        self.status == AppointmentStatus::Pending
    }

    pub fn belongs_to(&self, recipient: &str) -> bool {
        self.patient.matches(recipient)
    }
}

/// Patient details copied at booking time. Later changes to the patient
/// record do not flow back into existing appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub patient_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

impl PatientSnapshot {
    /// A recipient is addressed either by patient id or by e-mail.
    pub fn matches(&self, recipient: &str) -> bool {
        let recipient = recipient.trim();
        self.patient_id == recipient || self.email.eq_ignore_ascii_case(recipient)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[serde(alias = "f", alias = "Female")]
    Female,
    #[serde(alias = "m", alias = "Male")]
    Male,
    #[serde(alias = "Other")]
    Other,
    #[serde(alias = "prefer_not_to_say")]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Accepted,
        AppointmentStatus::Declined,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Accepted => "accepted",
            AppointmentStatus::Declined => "declined",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| AppointmentError::validation("status", format!("'{}' is not an appointment status", s)))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking input. Every field is optional at the wire level so that a
/// missing value is reported as a validation error naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient: Option<PatientDetails>,
    pub department: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDetails {
    pub patient_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

/// Edit input for a pending appointment. Status is deliberately absent and
/// unknown fields are rejected, so a status change cannot sneak in here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditAppointmentRequest {
    pub patient: Option<PatientPatch>,
    pub department: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// CONSISTENCY MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub appointment_id: Uuid,
    pub department: String,
    pub doctor_id: Uuid,
    pub kind: ConsistencyIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ConsistencyIssueKind {
    DoctorMissing,
    DoctorReassigned { department: String },
    DepartmentWithoutDoctors,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppointmentError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Cannot {operation} an appointment that is {status}")]
    InvalidState {
        status: AppointmentStatus,
        operation: &'static str,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Storage or directory unavailable: {0}")]
    TransientIo(String),
}

impl AppointmentError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppointmentError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Only I/O failures are worth retrying; everything else needs new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppointmentError::TransientIo(_))
    }
}

impl From<DirectoryError> for AppointmentError {
    fn from(error: DirectoryError) -> Self {
        AppointmentError::TransientIo(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.to_string().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn patient_matches_id_or_email() {
        let patient = PatientSnapshot {
            patient_id: "p-1".to_string(),
            name: "Ana".to_string(),
            email: "Ana@Example.org".to_string(),
            phone: None,
            gender: None,
        };
        assert!(patient.matches("p-1"));
        assert!(patient.matches("ana@example.org"));
        assert!(!patient.matches("p-2"));
    }

    #[test]
    fn edit_request_rejects_status_field() {
        let result = serde_json::from_str::<EditAppointmentRequest>(r#"{"status":"accepted"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(AppointmentError::TransientIo("down".into()).is_retryable());
        assert!(!AppointmentError::NotFound(Uuid::nil()).is_retryable());
    }
}
