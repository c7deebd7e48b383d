// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::{DirectoryLookup, Doctor};
use shared_models::auth::Actor;
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, EditAppointmentRequest,
    PatientSnapshot,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::AppointmentStore;
use crate::services::validation::{
    ensure_not_past, normalize_time, optional_text, parse_date, require_text, validate_email,
};

/// Per-appointment async locks. Every read-validate-write on one record runs
/// while holding that record's lock.
#[derive(Default)]
struct RecordLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl RecordLocks {
    async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody is holding or waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

/// The appointment lifecycle manager: booking, editing, status transitions
/// and removal, with directory and date checks on every write.
///
/// Writes to one appointment are serialized in-process. Between processes
/// sharing a hosted store the status-conditional update in
/// [`AppointmentStore::update_if_status`] rejects a write whose status
/// precondition no longer holds; non-status fields are last-write-wins.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn DirectoryLookup>,
    clock: Arc<dyn Clock>,
    lifecycle_service: AppointmentLifecycleService,
    locks: RecordLocks,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn DirectoryLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            lifecycle_service: AppointmentLifecycleService::new(),
            locks: RecordLocks::default(),
        }
    }

    pub fn directory(&self) -> &Arc<dyn DirectoryLookup> {
        &self.directory
    }

    pub fn store(&self) -> &Arc<dyn AppointmentStore> {
        &self.store
    }

    pub fn lifecycle(&self) -> &AppointmentLifecycleService {
        &self.lifecycle_service
    }

    #[instrument(skip(self, request, actor), fields(actor = %actor))]
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let patient = Self::patient_snapshot(&request)?;
        let department = require_text("department", request.department.as_deref())?;
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| AppointmentError::validation("doctor_id", "is required"))?;
        let date = parse_date(&require_text("date", request.date.as_deref())?)?;
        let time = normalize_time(&require_text("time", request.time.as_deref())?)?;

        ensure_not_past(date, self.clock.today())?;
        self.ensure_department_exists(&department).await?;
        self.ensure_doctor_in_department(doctor_id, &department).await?;

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient,
            department,
            doctor_id,
            date,
            time,
            status: AppointmentStatus::Pending,
            notes: optional_text(request.notes.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let appointment = self.store.insert(appointment).await?;
        info!(
            "Booked appointment {} for patient {} with doctor {} on {} {}",
            appointment.id, appointment.patient.patient_id, appointment.doctor_id, appointment.date, appointment.time
        );

        Ok(appointment)
    }

    #[instrument(skip(self, patch, actor), fields(actor = %actor))]
    pub async fn edit_appointment(
        &self,
        appointment_id: Uuid,
        patch: EditAppointmentRequest,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let _guard = self.locks.acquire(appointment_id).await;
        let current = self.load(appointment_id).await?;

        // State is checked before any field so the answer never depends on the patch.
        self.lifecycle_service.ensure_editable(current.status)?;

        let mut updated = current.clone();

        if let Some(patient) = &patch.patient {
            if let Some(name) = &patient.name {
                updated.patient.name = require_text("patient.name", Some(name))?;
            }
            if let Some(email) = &patient.email {
                let email = require_text("patient.email", Some(email))?;
                validate_email("patient.email", &email)?;
                updated.patient.email = email;
            }
            if patient.phone.is_some() {
                updated.patient.phone = optional_text(patient.phone.as_deref());
            }
            if patient.gender.is_some() {
                updated.patient.gender = patient.gender;
            }
        }

        if let Some(date) = &patch.date {
            updated.date = parse_date(date)?;
        }
        ensure_not_past(updated.date, self.clock.today())?;

        if let Some(time) = &patch.time {
            updated.time = normalize_time(time)?;
        }

        if patch.notes.is_some() {
            updated.notes = optional_text(patch.notes.as_deref());
        }

        if let Some(department) = &patch.department {
            updated.department = require_text("department", Some(department))?;
        }
        let department_changed = updated.department != current.department;
        if department_changed {
            self.ensure_department_exists(&updated.department).await?;
        }

        updated.doctor_id = match patch.doctor_id {
            Some(doctor_id) => {
                self.ensure_doctor_in_department(doctor_id, &updated.department).await?;
                doctor_id
            }
            None if department_changed => self.reselect_doctor(current.doctor_id, &updated.department).await?,
            None => {
                self.ensure_doctor_in_department(current.doctor_id, &updated.department).await?;
                current.doctor_id
            }
        };

        updated.updated_at = self.clock.now();

        let saved = self.write(updated, current.status).await?;
        info!("Edited appointment {}", saved.id);
        Ok(saved)
    }

    #[instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn transition_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let _guard = self.locks.acquire(appointment_id).await;
        let current = self.load(appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        let saved = self.apply_status(current, new_status).await?;
        info!("Appointment {} moved to {}", saved.id, saved.status);
        Ok(saved)
    }

    /// Patient-initiated cancellation; only a pending booking can be withdrawn.
    #[instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let _guard = self.locks.acquire(appointment_id).await;
        let current = self.load(appointment_id).await?;

        self.lifecycle_service.ensure_patient_cancellable(current.status)?;
        self.lifecycle_service
            .validate_status_transition(current.status, AppointmentStatus::Cancelled)?;

        let saved = self.apply_status(current, AppointmentStatus::Cancelled).await?;
        info!("Appointment {} cancelled by patient", saved.id);
        Ok(saved)
    }

    #[instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn delete_appointment(&self, appointment_id: Uuid, actor: &Actor) -> Result<(), AppointmentError> {
        let _guard = self.locks.acquire(appointment_id).await;

        if !self.store.delete(appointment_id).await? {
            return Err(AppointmentError::NotFound(appointment_id));
        }

        info!("Deleted appointment {}", appointment_id);
        Ok(())
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.load(appointment_id).await
    }

    /// Appointments of one patient, newest date first. The order is for
    /// display only.
    pub async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let recipient = require_text("recipient", Some(recipient))?;

        let mut appointments = self.store.list_by_recipient(&recipient).await?;
        // Hosted filters are looser than the in-process match.
        appointments.retain(|appointment| appointment.belongs_to(&recipient));
        appointments.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.time.cmp(&a.time))
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!("Found {} appointments for recipient", appointments.len());
        Ok(appointments)
    }

    pub async fn valid_transitions(&self, appointment_id: Uuid) -> Result<Vec<AppointmentStatus>, AppointmentError> {
        let current = self.load(appointment_id).await?;
        Ok(self.lifecycle_service.get_valid_transitions(current.status).to_vec())
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    fn patient_snapshot(request: &BookAppointmentRequest) -> Result<PatientSnapshot, AppointmentError> {
        let details = request
            .patient
            .as_ref()
            .ok_or_else(|| AppointmentError::validation("patient", "is required"))?;

        let email = require_text("patient.email", details.email.as_deref())?;
        validate_email("patient.email", &email)?;

        Ok(PatientSnapshot {
            patient_id: require_text("patient.patient_id", details.patient_id.as_deref())?,
            name: require_text("patient.name", details.name.as_deref())?,
            email,
            phone: optional_text(details.phone.as_deref()),
            gender: details.gender,
        })
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))
    }

    async fn apply_status(
        &self,
        current: Appointment,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let expected = current.status;
        let mut updated = current;
        updated.status = new_status;
        updated.updated_at = self.clock.now();
        self.write(updated, expected).await
    }

    /// Conditional write. When the stored status moved underneath us, the
    /// error reflects the record as it is now.
    async fn write(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let id = appointment.id;
        let attempted = appointment.status;

        if let Some(saved) = self.store.update_if_status(appointment, expected_status).await? {
            return Ok(saved);
        }

        let now = self.load(id).await?;
        warn!(
            "Appointment {} changed concurrently (expected {}, found {})",
            id, expected_status, now.status
        );

        if attempted == expected_status {
            Err(AppointmentError::InvalidState {
                status: now.status,
                operation: "edit",
            })
        } else {
            Err(AppointmentError::InvalidTransition {
                from: now.status,
                to: attempted,
            })
        }
    }

    async fn ensure_department_exists(&self, department: &str) -> Result<(), AppointmentError> {
        if !self.directory.department_exists(department).await? {
            return Err(AppointmentError::validation(
                "department",
                format!("{} is not a known department", department),
            ));
        }
        Ok(())
    }

    async fn ensure_doctor_in_department(&self, doctor_id: Uuid, department: &str) -> Result<Doctor, AppointmentError> {
        let doctor = self
            .directory
            .get_doctor(doctor_id)
            .await?
            .ok_or_else(|| AppointmentError::validation("doctor_id", format!("doctor {} does not exist", doctor_id)))?;

        if !doctor.belongs_to(department) {
            warn!(
                "Doctor {} belongs to {}, not {}",
                doctor_id, doctor.department, department
            );
            return Err(AppointmentError::validation(
                "doctor_id",
                format!("doctor {} belongs to {}, not {}", doctor_id, doctor.department, department),
            ));
        }

        Ok(doctor)
    }

    /// Keeps the current doctor when they also serve the new department,
    /// otherwise falls back to the first doctor in that department's list.
    async fn reselect_doctor(&self, current_doctor: Uuid, department: &str) -> Result<Uuid, AppointmentError> {
        let doctors = self.directory.doctors_by_department(department).await?;

        if doctors.iter().any(|doctor| doctor.doctor_id == current_doctor) {
            return Ok(current_doctor);
        }

        let first = doctors.first().ok_or_else(|| {
            AppointmentError::validation("department", format!("{} has no doctors available", department))
        })?;

        debug!("Reselected doctor {} for department {}", first.doctor_id, department);
        Ok(first.doctor_id)
    }
}
