use axum::{routing::get, Router};

use crate::handlers::{self, DirectoryState};

/// Directory routes are public reference data.
pub fn directory_routes(directory: DirectoryState) -> Router {
    Router::new()
        .route("/", get(handlers::list_departments))
        .route("/{department}/doctors", get(handlers::get_department_doctors))
        .with_state(directory)
}
