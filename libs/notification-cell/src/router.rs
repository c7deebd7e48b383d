use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, NotificationState};

pub fn notification_routes(state: NotificationState) -> Router {
    Router::new()
        .route("/{recipient}", get(handlers::get_notifications))
        .route("/{recipient}/read", post(handlers::mark_notifications_read))
        .route(
            "/{recipient}/watch",
            get(handlers::get_latest_poll)
                .post(handlers::watch_recipient)
                .delete(handlers::unwatch_recipient),
        )
        .layer(middleware::from_fn(actor_middleware))
        .with_state(state)
}
