use axum::{
    Router,
    routing::get,
};

use appointment_cell::handlers::AppointmentState;
use appointment_cell::router::appointment_routes;
use doctor_cell::handlers::DirectoryState;
use doctor_cell::router::directory_routes;
use notification_cell::handlers::NotificationState;
use notification_cell::router::notification_routes;

pub fn create_router(
    directory: DirectoryState,
    appointments: AppointmentState,
    notifications: NotificationState,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic appointments API is running!" }))
        .nest("/departments", directory_routes(directory))
        .nest("/appointments", appointment_routes(appointments))
        .nest("/notifications", notification_routes(notifications))
}
