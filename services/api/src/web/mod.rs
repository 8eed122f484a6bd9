pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::{require_auth, CurrentUser};
pub use rest::ApiDoc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the application router.
///
/// Registration, login, and the health check are public; every other route
/// sits behind the bearer-token middleware.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/", get(rest::health_handler))
        .route("/register", post(auth::register_handler))
        .route("/token", post(auth::token_handler));

    let protected_routes = Router::new()
        .route("/upload", post(rest::upload_handler))
        .route("/chat", post(rest::chat_handler))
        .route("/documents", get(rest::documents_handler))
        .route("/history", get(rest::history_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
