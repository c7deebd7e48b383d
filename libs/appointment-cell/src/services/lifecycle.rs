// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Status state machine. Holds no data; every rule is a pure function of the
/// statuses involved.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[
                AppointmentStatus::Accepted,
                AppointmentStatus::Declined,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Accepted => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Declined
            | AppointmentStatus::Cancelled
            | AppointmentStatus::Completed => &[],
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }

    /// Field edits are only possible before staff have acted on the booking.
    pub fn ensure_editable(&self, status: AppointmentStatus) -> Result<(), AppointmentError> {
        if status != AppointmentStatus::Pending {
            return Err(AppointmentError::InvalidState {
                status,
                operation: "edit",
            });
        }
        Ok(())
    }

    /// Patients may only withdraw a booking that is still pending. Cancelling
    /// an accepted appointment is a staff transition.
    pub fn ensure_patient_cancellable(&self, status: AppointmentStatus) -> Result<(), AppointmentError> {
        if status != AppointmentStatus::Pending {
            return Err(AppointmentError::InvalidState {
                status,
                operation: "cancel",
            });
        }
        Ok(())
    }
}
