//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

/// Middleware that validates the bearer token and extracts the username.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid, expired, or missing, returns 401 Unauthorized with no further detail.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse the bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate the token and resolve the username
    let username = state
        .tokens
        .validate(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 4. Insert the username into request extensions
    req.extensions_mut().insert(CurrentUser(username));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
