//! Shared helpers for the API integration tests: an app instance wired to an
//! in-memory database, a temp upload directory, and a stub inference backend
//! that records every prompt it is asked to complete.

#![allow(dead_code)]

use api_lib::adapters::{DbAdapter, FileTextExtractor};
use api_lib::config::Config;
use api_lib::documents::DocumentRepository;
use api_lib::tokens::TokenIssuer;
use api_lib::web::{router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Duration;
use doc_chat_core::ports::{DatabaseService, InferenceOutcome, InferenceService, TextExtractor};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const MULTIPART_BOUNDARY: &str = "integration-test-boundary";

//=========================================================================================
// Stub Inference Backend
//=========================================================================================

pub enum StubMode {
    /// Always answer with the given text.
    Answer(String),
    /// Simulate an unreachable or erroring backend.
    Degraded,
}

pub struct StubInference {
    mode: StubMode,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl InferenceService for StubInference {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> InferenceOutcome {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.mode {
            StubMode::Answer(answer) => InferenceOutcome::Answer(answer.clone()),
            StubMode::Degraded => InferenceOutcome::Degraded {
                reason: "stub backend down".to_string(),
            },
        }
    }

    async fn ping(&self) -> bool {
        matches!(self.mode, StubMode::Answer(_))
    }
}

//=========================================================================================
// Test App Construction
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    /// Every prompt the stub inference backend has been asked to complete.
    pub prompts: Arc<Mutex<Vec<String>>>,
    _upload_dir: TempDir,
}

impl TestApp {
    pub fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no prompt was sent to the stub backend")
    }
}

fn test_config(upload_dir: &TempDir) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::INFO,
        upload_dir: upload_dir.path().to_path_buf(),
        token_secret: "integration-test-secret".to_string(),
        token_ttl_minutes: 30,
        inference_url: "http://127.0.0.1:1234/v1/chat/completions".to_string(),
        inference_model: "test-model".to_string(),
        answer_max_tokens: 2000,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(StubMode::Answer("stub answer".to_string())).await
}

pub async fn spawn_app_with(mode: StubMode) -> TestApp {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let llm: Arc<dyn InferenceService> = Arc::new(StubInference {
        mode,
        prompts: prompts.clone(),
    });
    build_app(llm, prompts).await
}

/// Wires a caller-supplied inference service into an otherwise real app.
/// Used for wire-level end-to-end tests with the actual HTTP gateway.
pub async fn spawn_app_with_inference(llm: Arc<dyn InferenceService>) -> TestApp {
    build_app(llm, Arc::new(Mutex::new(Vec::new()))).await
}

async fn build_app(llm: Arc<dyn InferenceService>, prompts: Arc<Mutex<Vec<String>>>) -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    let db_adapter = Arc::new(DbAdapter::new(pool));
    db_adapter.run_migrations().await.unwrap();

    let upload_dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(&upload_dir));

    let db: Arc<dyn DatabaseService> = db_adapter;
    let documents = Arc::new(DocumentRepository::new(db.clone(), config.upload_dir.clone()));
    let extractor: Arc<dyn TextExtractor> = Arc::new(FileTextExtractor::new());
    let tokens = TokenIssuer::new(
        &config.token_secret,
        Duration::minutes(config.token_ttl_minutes),
    );

    let app_state = Arc::new(AppState {
        db,
        documents,
        extractor,
        llm,
        tokens,
        config,
    });

    TestApp {
        router: router(app_state),
        prompts,
        _upload_dir: upload_dir,
    }
}

//=========================================================================================
// Request Helpers
//=========================================================================================

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

pub async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    send(router, builder.body(body).unwrap()).await
}

pub async fn form_request(
    router: &Router,
    uri: &str,
    form: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(router, request).await
}

fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                MULTIPART_BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub async fn upload_request(
    router: &Router,
    token: &str,
    files: &[(&str, &[u8])],
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap();
    send(router, request).await
}

/// Registers a user and returns a bearer token for them.
pub async fn register_and_login(router: &Router, username: &str, password: &str) -> String {
    let (status, _) = json_request(
        router,
        "POST",
        "/register",
        Some(json!({"username": username, "password": password})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = form_request(
        router,
        "/token",
        &format!("username={}&password={}", username, password),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}
