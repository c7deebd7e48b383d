use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::DirectoryError;
use crate::services::directory::DirectoryLookup;

pub type DirectoryState = Arc<dyn DirectoryLookup>;

impl From<DirectoryError> for AppError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Unavailable(msg) => AppError::Unavailable(msg),
            DirectoryError::MalformedResponse(msg) => AppError::Internal(msg),
        }
    }
}

pub async fn list_departments(
    State(directory): State<DirectoryState>,
) -> Result<Json<Value>, AppError> {
    let departments = directory.list_departments().await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len(),
    })))
}

pub async fn get_department_doctors(
    State(directory): State<DirectoryState>,
    Path(department): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !directory.department_exists(&department).await? {
        return Err(AppError::NotFound(format!("Department {} not found", department)));
    }

    let doctors = directory.doctors_by_department(&department).await?;

    Ok(Json(json!({
        "department": department,
        "doctors": doctors,
        "total": doctors.len(),
    })))
}
