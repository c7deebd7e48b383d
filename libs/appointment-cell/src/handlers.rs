// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, EditAppointmentRequest, TransitionRequest};
use crate::services::booking::AppointmentBookingService;
use crate::services::consistency::DirectoryConsistencyService;

#[derive(Clone)]
pub struct AppointmentState {
    pub booking: Arc<AppointmentBookingService>,
    pub consistency: Arc<DirectoryConsistencyService>,
}

impl AppointmentState {
    pub fn new(booking: Arc<AppointmentBookingService>) -> Self {
        let consistency = Arc::new(DirectoryConsistencyService::new(
            Arc::clone(booking.store()),
            Arc::clone(booking.directory()),
        ));
        Self { booking, consistency }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::Validation { .. } => AppError::ValidationError(error.to_string()),
            AppointmentError::InvalidState { .. } | AppointmentError::InvalidTransition { .. } => {
                AppError::Conflict(error.to_string())
            }
            AppointmentError::NotFound(_) => AppError::NotFound(error.to_string()),
            AppointmentError::TransientIo(_) => AppError::Unavailable(error.to_string()),
        }
    }
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking.book_appointment(request, &actor).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

pub async fn edit_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<EditAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .edit_appointment(appointment_id, request, &actor)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

pub async fn transition_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .transition_status(appointment_id, request.status, &actor)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment is now {}", appointment.status)
    })))
}

pub async fn get_valid_transitions(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let transitions = state.booking.valid_transitions(appointment_id).await?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "valid_transitions": transitions,
    })))
}

pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.cancel_appointment(appointment_id, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, AppError> {
    state.booking.delete_appointment(appointment_id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// LISTINGS
// ==============================================================================

pub async fn get_patient_appointments(
    State(state): State<AppointmentState>,
    Path(recipient): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list_by_recipient(&recipient).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

pub async fn check_directory_consistency(
    State(state): State<AppointmentState>,
) -> Result<Json<Value>, AppError> {
    let issues = state.consistency.pending_issues().await?;

    Ok(Json(json!({
        "consistent": issues.is_empty(),
        "issues": issues,
    })))
}
