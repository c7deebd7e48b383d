// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Durable appointment records keyed by id. Persistence only: no rule
/// checking happens here.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Replaces the stored record only while its status still equals
    /// `expected_status`. `Ok(None)` means the record is gone or has moved on.
    async fn update_if_status(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentError>;

    async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppointmentError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    records: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut records = self.records.write().await;
        if records.contains_key(&appointment.id) {
            return Err(AppointmentError::validation("id", format!("{} already exists", appointment.id)));
        }
        records.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update_if_status(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut records = self.records.write().await;
        match records.get_mut(&appointment.id) {
            Some(existing) if existing.status == expected_status => {
                *existing = appointment.clone();
                Ok(Some(appointment))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|appointment| appointment.belongs_to(recipient))
            .cloned()
            .collect())
    }

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|appointment| appointment.status == status)
            .cloned()
            .collect())
    }
}
