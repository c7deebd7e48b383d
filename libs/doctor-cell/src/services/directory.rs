use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{DirectoryError, Doctor, DoctorSummary};

/// Read-only department/doctor reference data.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn list_departments(&self) -> Result<Vec<String>, DirectoryError>;

    /// Doctors of a department in canonical order. Unknown departments yield
    /// an empty list.
    async fn doctors_by_department(&self, department: &str) -> Result<Vec<DoctorSummary>, DirectoryError>;

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError>;

    async fn department_exists(&self, department: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .list_departments()
            .await?
            .iter()
            .any(|name| name == department))
    }
}

#[derive(Debug, Default)]
struct DirectoryData {
    departments: Vec<String>,
    doctors: Vec<Doctor>,
}

impl DirectoryData {
    fn register_department(&mut self, department: &str) {
        if !self.departments.iter().any(|d| d == department) {
            self.departments.push(department.to_string());
        }
    }
}

/// Directory held in memory. Canonical doctor order is insertion order.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    data: RwLock<DirectoryData>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctors(doctors: Vec<Doctor>) -> Self {
        let mut data = DirectoryData::default();
        for doctor in &doctors {
            data.register_department(&doctor.department);
        }
        data.doctors = doctors;

        Self {
            data: RwLock::new(data),
        }
    }

    /// Small default clinic used when no hosted directory is configured.
    pub fn seeded() -> Self {
        let directory = Self::with_doctors(vec![
            Doctor::new(Uuid::from_u128(0x0c1a_0001), "Dr. Amara Okafor", "Cardiology"),
            Doctor::new(Uuid::from_u128(0x0c1a_0002), "Dr. Lucas Brandt", "Cardiology"),
            Doctor::new(Uuid::from_u128(0x0c1a_0003), "Dr. Mei Tanaka", "Neurology"),
            Doctor::new(Uuid::from_u128(0x0c1a_0004), "Dr. Rafael Ortiz", "Neurology"),
            Doctor::new(Uuid::from_u128(0x0c1a_0005), "Dr. Ingrid Solberg", "Pediatrics"),
            Doctor::new(Uuid::from_u128(0x0c1a_0006), "Dr. Kwame Mensah", "General Medicine"),
        ]);
        info!("Seeded in-memory directory with default departments");
        directory
    }

    pub async fn add_department(&self, department: &str) {
        self.data.write().await.register_department(department);
    }

    pub async fn add_doctor(&self, doctor: Doctor) {
        let mut data = self.data.write().await;
        data.register_department(&doctor.department);
        data.doctors.retain(|d| d.id != doctor.id);
        data.doctors.push(doctor);
    }

    /// Moves a doctor to another department. Existing appointments are not
    /// touched; pending ones show up in the appointment consistency report.
    pub async fn reassign_doctor(&self, doctor_id: Uuid, department: &str) -> bool {
        let mut data = self.data.write().await;
        data.register_department(department);
        match data.doctors.iter_mut().find(|d| d.id == doctor_id) {
            Some(doctor) => {
                debug!("Reassigning doctor {} from {} to {}", doctor_id, doctor.department, department);
                doctor.department = department.to_string();
                true
            }
            None => false,
        }
    }

    pub async fn remove_doctor(&self, doctor_id: Uuid) -> bool {
        let mut data = self.data.write().await;
        let before = data.doctors.len();
        data.doctors.retain(|d| d.id != doctor_id);
        data.doctors.len() != before
    }
}

#[async_trait]
impl DirectoryLookup for InMemoryDirectory {
    async fn list_departments(&self) -> Result<Vec<String>, DirectoryError> {
        Ok(self.data.read().await.departments.clone())
    }

    async fn doctors_by_department(&self, department: &str) -> Result<Vec<DoctorSummary>, DirectoryError> {
        let data = self.data.read().await;
        Ok(data
            .doctors
            .iter()
            .filter(|doctor| doctor.belongs_to(department))
            .map(Doctor::summary)
            .collect())
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        let data = self.data.read().await;
        Ok(data.doctors.iter().find(|d| d.id == doctor_id).cloned())
    }
}
