//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.
//!
//! Ids are stored as hyphenated UUID text and timestamps as fixed-precision
//! RFC 3339 text, so lexicographic ordering matches chronological ordering.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use doc_chat_core::domain::{ChatTurn, Document, UserCredentials};
use doc_chat_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};
use std::path::PathBuf;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> PortResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PortError::Unexpected(format!("invalid stored timestamp '{}': {}", raw, e)))
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    username: String,
    password_hash: String,
}

impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: String,
    username: String,
    filename: String,
    file_path: String,
    upload_date: String,
}

impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| PortError::Unexpected(format!("invalid stored document id: {}", e)))?;
        Ok(Document {
            id,
            owner: self.username,
            original_filename: self.filename,
            storage_path: PathBuf::from(self.file_path),
            uploaded_at: parse_timestamp(&self.upload_date)?,
        })
    }
}

#[derive(FromRow)]
struct ChatTurnRecord {
    username: String,
    message: String,
    response: String,
    timestamp: String,
}

impl ChatTurnRecord {
    fn to_domain(self) -> PortResult<ChatTurn> {
        Ok(ChatTurn {
            owner: self.username,
            question: self.message,
            answer: self.response,
            timestamp: parse_timestamp(&self.timestamp)?,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<()> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                // The primary key serializes two concurrent registrations of
                // the same username; the loser sees AlreadyExists.
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    PortError::AlreadyExists(format!("user '{}' already exists", username))
                }
                _ => unexpected(e),
            })?;
        Ok(())
    }

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("user '{}' not found", username)))?;

        Ok(record.to_domain())
    }

    async fn insert_document(&self, document: &Document) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO documents (id, username, filename, file_path, upload_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(document.id.to_string())
        .bind(&document.owner)
        .bind(&document.original_filename)
        .bind(document.storage_path.to_string_lossy().into_owned())
        .bind(format_timestamp(&document.uploaded_at))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_documents(&self, owner: &str) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, username, filename, file_path, upload_date FROM documents \
             WHERE username = ? ORDER BY rowid",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn resolve_document(&self, owner: &str, id: Uuid) -> PortResult<Document> {
        // A row owned by someone else and a row that does not exist produce
        // the same NotFound, so existence of other users' documents is never
        // revealed.
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, username, filename, file_path, upload_date FROM documents \
             WHERE id = ? AND username = ?",
        )
        .bind(id.to_string())
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("document not found".to_string()))?;

        record.to_domain()
    }

    async fn append_chat_turn(&self, turn: &ChatTurn) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO chat_history (username, message, response, timestamp) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&turn.owner)
        .bind(&turn.question)
        .bind(&turn.answer)
        .bind(format_timestamp(&turn.timestamp))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn chat_history(&self, owner: &str) -> PortResult<Vec<ChatTurn>> {
        let records = sqlx::query_as::<_, ChatTurnRecord>(
            "SELECT username, message, response, timestamp FROM chat_history \
             WHERE username = ? ORDER BY timestamp DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
