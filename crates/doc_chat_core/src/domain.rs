//! crates/doc_chat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password_hash: String,
}

/// Represents a document uploaded by a user.
///
/// `storage_path` is a server-local path and is never exposed to clients.
/// The extracted text is not part of this struct: it is recomputed from the
/// stored file on every chat turn.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub owner: String,
    pub original_filename: String,
    pub storage_path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
}

/// A single question-and-answer exchange, appended to the per-user history.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub owner: String,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}
