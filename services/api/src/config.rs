//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The signing secret, inference endpoint,
//! and token lifetime live here so nothing security-relevant is a compiled-in
//! literal.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub upload_dir: PathBuf,
    pub token_secret: String,
    pub token_ttl_minutes: i64,
    pub inference_url: String,
    pub inference_model: String,
    pub answer_max_tokens: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        // --- Load Auth Settings ---
        let token_secret = std::env::var("TOKEN_SECRET")
            .map_err(|_| ConfigError::MissingVar("TOKEN_SECRET".to_string()))?;

        let token_ttl_str =
            std::env::var("TOKEN_TTL_MINUTES").unwrap_or_else(|_| "30".to_string());
        let token_ttl_minutes = token_ttl_str.parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(
                "TOKEN_TTL_MINUTES".to_string(),
                format!("'{}' is not a valid number of minutes", token_ttl_str),
            )
        })?;

        // --- Load Inference Backend Settings ---
        let inference_url = std::env::var("INFERENCE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:1234/v1/chat/completions".to_string());
        let inference_model = std::env::var("INFERENCE_MODEL")
            .unwrap_or_else(|_| "mistral-nemo-instruct-2407".to_string());

        let max_tokens_str =
            std::env::var("ANSWER_MAX_TOKENS").unwrap_or_else(|_| "2000".to_string());
        let answer_max_tokens = max_tokens_str.parse::<u32>().map_err(|_| {
            ConfigError::InvalidValue(
                "ANSWER_MAX_TOKENS".to_string(),
                format!("'{}' is not a valid token count", max_tokens_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            upload_dir,
            token_secret,
            token_ttl_minutes,
            inference_url,
            inference_model,
            answer_max_tokens,
        })
    }
}
