use thiserror::Error;

use appointment_cell::AppointmentError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Appointment feed failed: {0}")]
    Feed(#[from] AppointmentError),

    #[error("Acknowledgement store failed: {0}")]
    Storage(String),

    #[error("Poll task failed: {0}")]
    Task(String),
}

impl NotificationError {
    /// A failed tick with one of these just means "nothing new this time".
    pub fn is_transient(&self) -> bool {
        match self {
            NotificationError::Feed(error) => error.is_retryable(),
            NotificationError::Storage(_) | NotificationError::Task(_) => true,
            NotificationError::InvalidRecipient(_) => false,
        }
    }
}
