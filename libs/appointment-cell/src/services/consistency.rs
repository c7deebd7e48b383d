// libs/appointment-cell/src/services/consistency.rs
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use doctor_cell::DirectoryLookup;

use crate::models::{AppointmentError, AppointmentStatus, ConsistencyIssue, ConsistencyIssueKind};
use crate::services::store::AppointmentStore;

/// Finds pending appointments whose doctor/department pairing no longer holds
/// in the directory (doctor removed or moved after booking). Records are
/// reported, never rewritten; the next edit has to pick a valid doctor.
pub struct DirectoryConsistencyService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn DirectoryLookup>,
}

impl DirectoryConsistencyService {
    pub fn new(store: Arc<dyn AppointmentStore>, directory: Arc<dyn DirectoryLookup>) -> Self {
        Self { store, directory }
    }

    #[instrument(skip(self))]
    pub async fn pending_issues(&self) -> Result<Vec<ConsistencyIssue>, AppointmentError> {
        let pending = self.store.list_by_status(AppointmentStatus::Pending).await?;
        let mut staffed: HashMap<String, bool> = HashMap::new();
        let mut issues = Vec::new();

        for appointment in pending {
            let kind = match self.directory.get_doctor(appointment.doctor_id).await? {
                Some(doctor) if doctor.belongs_to(&appointment.department) => continue,
                Some(doctor) => ConsistencyIssueKind::DoctorReassigned {
                    department: doctor.department,
                },
                None => ConsistencyIssueKind::DoctorMissing,
            };

            let has_doctors = match staffed.get(&appointment.department) {
                Some(known) => *known,
                None => {
                    let known = !self
                        .directory
                        .doctors_by_department(&appointment.department)
                        .await?
                        .is_empty();
                    staffed.insert(appointment.department.clone(), known);
                    known
                }
            };

            let kind = if has_doctors {
                kind
            } else {
                ConsistencyIssueKind::DepartmentWithoutDoctors
            };

            warn!(
                "Pending appointment {} is inconsistent with the directory: {:?}",
                appointment.id, kind
            );
            issues.push(ConsistencyIssue {
                appointment_id: appointment.id,
                department: appointment.department,
                doctor_id: appointment.doctor_id,
                kind,
            });
        }

        issues.sort_by(|a, b| a.appointment_id.cmp(&b.appointment_id));
        info!("Consistency check found {} issue(s)", issues.len());
        Ok(issues)
    }
}
