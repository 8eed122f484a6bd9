//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FileTextExtractor, LmStudioGateway},
    config::Config,
    documents::DocumentRepository,
    error::ApiError,
    tokens::TokenIssuer,
    web::{router, rest::ApiDoc, state::AppState},
};
use chrono::Duration;
use doc_chat_core::ports::{DatabaseService, InferenceService, TextExtractor};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Prepare the Upload Area & Service Adapters ---
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let db: Arc<dyn DatabaseService> = db_adapter;
    let documents = Arc::new(DocumentRepository::new(
        db.clone(),
        config.upload_dir.clone(),
    ));
    let extractor: Arc<dyn TextExtractor> = Arc::new(FileTextExtractor::new());
    let llm: Arc<dyn InferenceService> = Arc::new(LmStudioGateway::new(
        config.inference_url.clone(),
        config.inference_model.clone(),
    ));
    let tokens = TokenIssuer::new(
        &config.token_secret,
        Duration::minutes(config.token_ttl_minutes),
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        documents,
        extractor,
        llm,
        tokens,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- 5. Create the Web Router ---
    let app = axum::Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
