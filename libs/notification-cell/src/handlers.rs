use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::error::NotificationError;
use crate::models::AcknowledgeRequest;
use crate::services::registry::PollerRegistry;

#[derive(Clone)]
pub struct NotificationState {
    pub registry: Arc<PollerRegistry>,
}

impl NotificationState {
    pub fn new(registry: Arc<PollerRegistry>) -> Self {
        Self { registry }
    }
}

impl From<NotificationError> for AppError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::InvalidRecipient(message) => AppError::BadRequest(message),
            NotificationError::Feed(inner) => AppError::from(inner),
            NotificationError::Storage(_) => AppError::Unavailable(error.to_string()),
            NotificationError::Task(_) => AppError::Internal(error.to_string()),
        }
    }
}

pub async fn get_notifications(
    State(state): State<NotificationState>,
    Path(recipient): Path<String>,
) -> Result<Json<Value>, AppError> {
    let unread = state.registry.poller().poll_once(&recipient).await?;
    let watching = state.registry.is_watching(&recipient).await;

    Ok(Json(json!({
        "recipient": recipient,
        "notifications": unread,
        "total": unread.len(),
        "watching": watching,
    })))
}

pub async fn mark_notifications_read(
    State(state): State<NotificationState>,
    Path(recipient): Path<String>,
    Json(request): Json<AcknowledgeRequest>,
) -> Result<Json<Value>, AppError> {
    let poller = state.registry.poller();

    let acknowledged = if request.all {
        poller.mark_all_read(&recipient).await?
    } else if request.appointment_ids.is_empty() {
        return Err(AppError::BadRequest(
            "appointment_ids must not be empty unless all is set".to_string(),
        ));
    } else {
        poller.mark_read(&recipient, &request.appointment_ids).await?
    };

    let unread = poller.poll_once(&recipient).await?;

    Ok(Json(json!({
        "success": true,
        "acknowledged": acknowledged.len(),
        "notifications": unread,
        "total": unread.len(),
    })))
}

pub async fn watch_recipient(
    State(state): State<NotificationState>,
    Path(recipient): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let started = state.registry.watch(&recipient).await?;
    let status = if started { StatusCode::CREATED } else { StatusCode::OK };

    Ok((
        status,
        Json(json!({
            "success": true,
            "recipient": recipient,
            "started": started,
            "interval_seconds": state.registry.poller().interval().as_secs(),
        })),
    ))
}

pub async fn get_latest_poll(
    State(state): State<NotificationState>,
    Path(recipient): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.registry.is_watching(&recipient).await {
        return Err(AppError::NotFound(format!("{} is not being watched", recipient)));
    }

    let latest = state.registry.latest(&recipient).await;
    Ok(Json(json!({
        "recipient": recipient,
        "latest": latest,
    })))
}

pub async fn unwatch_recipient(
    State(state): State<NotificationState>,
    Path(recipient): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.registry.unwatch(&recipient).await {
        return Err(AppError::NotFound(format!("{} is not being watched", recipient)));
    }
    Ok(StatusCode::NO_CONTENT)
}
