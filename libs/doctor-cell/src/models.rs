use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub department: String,
}

impl Doctor {
    pub fn new(id: Uuid, name: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            department: department.into(),
        }
    }

    pub fn belongs_to(&self, department: &str) -> bool {
        self.department == department
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            doctor_id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Entry of a department's doctor list, in the directory's canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub doctor_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRow {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Directory returned malformed data: {0}")]
    MalformedResponse(String),
}
