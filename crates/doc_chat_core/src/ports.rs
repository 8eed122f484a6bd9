//! crates/doc_chat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{ChatTurn, Document, UserCredentials};
use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Degraded-Result Types
//=========================================================================================

/// Outcome of a text extraction attempt.
///
/// Extraction never fails past this boundary: a corrupt file, an unsupported
/// extension, or an I/O error all degrade to `Empty` so a chat request can
/// proceed with "no content" instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Non-empty extracted text.
    Text(String),
    /// No usable text; the reason is kept for server-side diagnostics only.
    Empty { reason: String },
}

impl Extraction {
    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::Text(text) => Some(text),
            Extraction::Empty { .. } => None,
        }
    }
}

/// Outcome of an inference round trip.
///
/// A failed call is not an error: it degrades to `Degraded` and the chat
/// endpoint substitutes a fixed apologetic answer, keeping the request a 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceOutcome {
    /// The model's text content, parsed from a successful response.
    Answer(String),
    /// The backend was unreachable, errored, or replied with an unparseable body.
    Degraded { reason: String },
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Credential store ---
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<()>;

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials>;

    // --- Document metadata ---
    async fn insert_document(&self, document: &Document) -> PortResult<()>;

    async fn list_documents(&self, owner: &str) -> PortResult<Vec<Document>>;

    /// Resolves a document scoped to its owner. A document that does not
    /// exist and a document owned by someone else are indistinguishable:
    /// both are `NotFound`.
    async fn resolve_document(&self, owner: &str, id: Uuid) -> PortResult<Document>;

    // --- Chat history ---
    async fn append_chat_turn(&self, turn: &ChatTurn) -> PortResult<()>;

    /// Returns the caller's chat turns ordered by timestamp descending.
    async fn chat_history(&self, owner: &str) -> PortResult<Vec<ChatTurn>>;

    // --- Health ---
    async fn ping(&self) -> PortResult<()>;
}

/// Dispatches a stored file to the extraction routine for its extension.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Extraction;
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Sends one prompt as a single user-role message and returns the model's
    /// reply, degrading on any transport or protocol failure. No retry, no
    /// backoff, no streaming.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> InferenceOutcome;

    /// Cheap reachability probe used by the health check.
    async fn ping(&self) -> bool;
}
