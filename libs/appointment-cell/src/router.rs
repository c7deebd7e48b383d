// libs/appointment-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, AppointmentState};

pub fn appointment_routes(state: AppointmentState) -> Router {
    // All appointment operations are attributed to a caller
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/consistency", get(handlers::check_directory_consistency))
        .route("/patients/{recipient}", get(handlers::get_patient_appointments))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::edit_appointment)
                .delete(handlers::delete_appointment),
        )
        .route("/{appointment_id}/status", post(handlers::transition_appointment))
        .route("/{appointment_id}/transitions", get(handlers::get_valid_transitions))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn(actor_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
