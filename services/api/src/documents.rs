//! services/api/src/documents.rs
//!
//! The document repository: owns the on-disk upload area and the metadata
//! rows behind it. Uploaded bytes land under a per-owner directory keyed by
//! the generated document id plus the original extension; the original
//! filename only ever appears in metadata.

use chrono::Utc;
use doc_chat_core::domain::Document;
use doc_chat_core::ports::{DatabaseService, PortError, PortResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Upload batches larger than this are rejected whole.
pub const MAX_FILES_PER_UPLOAD: usize = 5;

const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "doc", "txt"];

pub struct DocumentRepository {
    db: Arc<dyn DatabaseService>,
    upload_dir: PathBuf,
}

impl DocumentRepository {
    pub fn new(db: Arc<dyn DatabaseService>, upload_dir: PathBuf) -> Self {
        Self { db, upload_dir }
    }

    /// Persists one uploaded file for `owner`.
    ///
    /// Files with an extension outside the allowed set are skipped silently:
    /// the result is `Ok(None)`, not an error, so one bad file never spoils
    /// a batch. Otherwise the bytes are written under the owner's directory
    /// and a metadata row is inserted.
    pub async fn store(
        &self,
        owner: &str,
        filename: &str,
        bytes: &[u8],
    ) -> PortResult<Option<Document>> {
        let Some(extension) = allowed_extension(filename) else {
            return Ok(None);
        };

        let id = Uuid::new_v4();
        let user_dir = self.upload_dir.join(owner);
        tokio::fs::create_dir_all(&user_dir).await.map_err(|e| {
            PortError::Unexpected(format!("failed to create upload directory: {}", e))
        })?;

        let storage_path = user_dir.join(format!("{}.{}", id, extension));
        tokio::fs::write(&storage_path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to write upload: {}", e)))?;

        let document = Document {
            id,
            owner: owner.to_string(),
            original_filename: filename.to_string(),
            storage_path,
            uploaded_at: Utc::now(),
        };
        self.db.insert_document(&document).await?;
        Ok(Some(document))
    }

    pub async fn list_for(&self, owner: &str) -> PortResult<Vec<Document>> {
        self.db.list_documents(owner).await
    }

    pub async fn resolve(&self, owner: &str, id: Uuid) -> PortResult<Document> {
        self.db.resolve_document(owner, id).await
    }
}

fn allowed_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Some(extension)
    } else {
        None
    }
}
