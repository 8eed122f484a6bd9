//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::documents::MAX_FILES_PER_UPLOAD;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use doc_chat_core::context::assemble;
use doc_chat_core::domain::ChatTurn;
use doc_chat_core::ports::{Extraction, InferenceOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// The fixed answer substituted when the inference backend cannot produce one.
/// The chat endpoint still returns 200 with this text instead of a 5xx.
pub const DEGRADED_RESPONSE: &str =
    "I'm sorry, I couldn't reach the language model service. Please try again later.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::register_handler,
        crate::web::auth::token_handler,
        upload_handler,
        chat_handler,
        documents_handler,
        history_handler,
    ),
    components(schemas(
        crate::web::auth::RegisterRequest,
        crate::web::auth::RegisterResponse,
        crate::web::auth::TokenRequest,
        crate::web::auth::TokenResponse,
        UploadResponse,
        UploadedDocument,
        ChatRequest,
        ChatResponse,
        DocumentsResponse,
        DocumentSummary,
        HistoryResponse,
        HistoryEntry,
        HealthResponse,
    )),
    tags(
        (name = "Document Chat API", description = "API endpoints for uploading documents and chatting about their content.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UploadedDocument {
    pub document_id: Uuid,
    pub filename: String,
    /// Character count of the text extracted at upload time.
    pub size: usize,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub uploaded_documents: Vec<UploadedDocument>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Opaque document ids to ground the answer on. Ids that do not parse or
    /// do not resolve for the caller are silently dropped.
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub source_documents: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentsResponse {
    pub documents: Vec<DocumentSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub inference_backend: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET / - Health check
///
/// Reports reachability of the database and the inference backend
/// independently. The call itself never fails.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!("Database health probe failed: {:?}", e);
            "disconnected"
        }
    };

    let inference_backend = if state.llm.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        inference_backend: inference_backend.to_string(),
    })
}

/// POST /upload - Upload up to 5 documents
///
/// Accepts a multipart/form-data request. Files with unsupported extensions
/// are skipped silently; a batch larger than the cap is rejected whole,
/// before anything is persisted.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", description = "The documents to upload (at most 5)."),
    responses(
        (status = 200, description = "Batch processed", body = UploadResponse),
        (status = 400, description = "Too many files or unreadable multipart data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Read the whole batch first so an oversized one persists nothing
    let mut files: Vec<(String, Bytes)> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let Some(filename) = field.file_name().map(|n| n.to_string()) else {
            // Not a file part (e.g. a plain form field); ignore it.
            continue;
        };
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        files.push((filename, data));
    }

    if files.len() > MAX_FILES_PER_UPLOAD {
        return Err((StatusCode::BAD_REQUEST, "Maximum 5 files allowed".to_string()));
    }

    // 2. Store each file; unsupported extensions are skipped, not errors
    let mut uploaded_documents = Vec::new();
    for (filename, data) in files {
        let stored = state
            .documents
            .store(&username, &filename, &data)
            .await
            .map_err(|e| {
                error!("Failed to store upload: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store upload".to_string(),
                )
            })?;
        let Some(document) = stored else {
            continue;
        };

        // 3. Report the extracted text size for each stored file
        let size = match state.extractor.extract(&document.storage_path) {
            Extraction::Text(text) => text.chars().count(),
            Extraction::Empty { .. } => 0,
        };
        uploaded_documents.push(UploadedDocument {
            document_id: document.id,
            filename: document.original_filename,
            size,
        });
    }

    Ok(Json(UploadResponse { uploaded_documents }))
}

/// POST /chat - Ask a question about previously uploaded documents
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer, possibly degraded", body = ChatResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Parse the ids; unparseable ones are dropped like unresolvable ones
    let document_ids: Vec<Uuid> = req
        .document_ids
        .iter()
        .filter_map(|raw| Uuid::parse_str(raw).ok())
        .collect();

    // 2. Assemble the bounded prompt from the caller's documents
    let context = assemble(
        &username,
        &req.message,
        &document_ids,
        state.db.as_ref(),
        state.extractor.as_ref(),
    )
    .await
    .map_err(|e| {
        error!("Failed to assemble chat context: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Chat failed".to_string(),
        )
    })?;

    // 3. One synchronous round trip to the inference backend
    let answer = match state
        .llm
        .complete(&context.prompt, state.config.answer_max_tokens)
        .await
    {
        InferenceOutcome::Answer(text) => text,
        InferenceOutcome::Degraded { reason } => {
            warn!(%reason, "Inference backend degraded; returning fallback answer");
            DEGRADED_RESPONSE.to_string()
        }
    };

    // 4. Record the turn, degraded answers included
    let turn = ChatTurn {
        owner: username,
        question: req.message,
        answer: answer.clone(),
        timestamp: Utc::now(),
    };
    state.db.append_chat_turn(&turn).await.map_err(|e| {
        error!("Failed to record chat turn: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Chat failed".to_string(),
        )
    })?;

    Ok(Json(ChatResponse {
        response: answer,
        source_documents: context.source_documents,
    }))
}

/// GET /documents - List the caller's documents
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The caller's documents", body = DocumentsResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let documents = state.documents.list_for(&username).await.map_err(|e| {
        error!("Failed to list documents: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list documents".to_string(),
        )
    })?;

    Ok(Json(DocumentsResponse {
        documents: documents
            .into_iter()
            .map(|d| DocumentSummary {
                id: d.id,
                filename: d.original_filename,
                upload_date: d.uploaded_at,
            })
            .collect(),
    }))
}

/// GET /history - The caller's chat history, most recent first
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "The caller's chat history", body = HistoryResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let history = state.db.chat_history(&username).await.map_err(|e| {
        error!("Failed to load chat history: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load history".to_string(),
        )
    })?;

    Ok(Json(HistoryResponse {
        history: history
            .into_iter()
            .map(|t| HistoryEntry {
                message: t.question,
                response: t.answer,
                timestamp: t.timestamp,
            })
            .collect(),
    }))
}
