use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_models::auth::Actor;
use shared_models::error::AppError;

/// Pulls the bearer token off the request and stores it as an [`Actor`]
/// extension. The token itself is not verified here.
pub async fn actor_middleware(mut request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let actor = actor_from_request(&request)?;
    debug!("Request attributed to actor {}", actor);

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

pub fn actor_from_request<B>(request: &Request<B>) -> Result<Actor, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    Ok(Actor::new(token))
}
