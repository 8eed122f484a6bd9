//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration and token issuance.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Form, Json,
};
use doc_chat_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
}

/// OAuth2 password-flow style form body for `POST /token`.
#[derive(Deserialize, ToSchema)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Usernames name an on-disk upload directory, so their shape is restricted:
/// ASCII alphanumerics plus `.`, `_`, `-`, at most 64 characters, starting
/// with an alphanumeric. This also rules out path-hostile names like `..`.
fn valid_username(username: &str) -> bool {
    let mut chars = username.chars();
    let starts_alphanumeric = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    starts_alphanumeric
        && username.len() <= 64
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new user account
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Username already registered or invalid"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the username shape
    if !valid_username(&req.username) {
        return Err((StatusCode::BAD_REQUEST, "Invalid username".to_string()));
    }

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    // 3. Create the user row; the unique username constraint decides races
    match state.db.create_user(&req.username, &password_hash).await {
        Ok(()) => Ok(Json(RegisterResponse {
            message: "User registered successfully".to_string(),
        })),
        Err(PortError::AlreadyExists(_)) => Err((
            StatusCode::BAD_REQUEST,
            "Username already registered".to_string(),
        )),
        Err(e) => {
            error!("Failed to create user: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            ))
        }
    }
}

/// POST /token - Login with existing account to get a bearer token
#[utoipa::path(
    post,
    path = "/token",
    request_body(content_type = "application/x-www-form-urlencoded", description = "username and password"),
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn token_handler(
    State(state): State<Arc<AppState>>,
    Form(req): Form<TokenRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Unknown user and wrong password intentionally produce the same response.
    const BAD_CREDENTIALS: &str = "Incorrect username or password";

    // 1. Look up the stored credentials
    let credentials = match state.db.get_user_credentials(&req.username).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            return Err((StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string()))
        }
        Err(e) => {
            error!("Failed to load credentials: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            ));
        }
    };

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string()));
    }

    // 3. Issue the bearer token
    let access_token = state.tokens.issue(&req.username).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token".to_string(),
        )
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
