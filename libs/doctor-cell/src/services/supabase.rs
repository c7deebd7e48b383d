use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DepartmentRow, DirectoryError, Doctor, DoctorSummary};
use crate::services::directory::DirectoryLookup;

/// Directory backed by the hosted `doctors` and `departments` tables.
pub struct SupabaseDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch_doctors(&self, path: &str) -> Result<Vec<Doctor>, DirectoryError> {
        self.supabase
            .request::<Vec<Doctor>>(Method::GET, path, None, None)
            .await
            .map_err(|e| {
                warn!("Doctor lookup failed: {}", e);
                classify(e)
            })
    }
}

fn classify(error: anyhow::Error) -> DirectoryError {
    if let Some(req_err) = error.downcast_ref::<reqwest::Error>() {
        if req_err.is_decode() {
            return DirectoryError::MalformedResponse(req_err.to_string());
        }
    }
    DirectoryError::Unavailable(error.to_string())
}

#[async_trait]
impl DirectoryLookup for SupabaseDirectory {
    async fn list_departments(&self) -> Result<Vec<String>, DirectoryError> {
        let rows: Vec<DepartmentRow> = self
            .supabase
            .request(Method::GET, "/rest/v1/departments?select=name&order=name.asc", None, None)
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn doctors_by_department(&self, department: &str) -> Result<Vec<DoctorSummary>, DirectoryError> {
        debug!("Fetching doctors for department {}", department);
        let path = format!(
            "/rest/v1/doctors?department=eq.{}&select=id,name,department&order=name.asc,id.asc",
            urlencoding::encode(department)
        );

        let doctors = self.fetch_doctors(&path).await?;
        Ok(doctors
            .iter()
            .filter(|doctor| doctor.belongs_to(department))
            .map(Doctor::summary)
            .collect())
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id,name,department", doctor_id);
        let doctors = self.fetch_doctors(&path).await?;
        Ok(doctors.into_iter().next())
    }
}
