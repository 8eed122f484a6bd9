//! crates/doc_chat_core/src/context.rs
//!
//! The context assembler: turns a question plus a list of document ids into
//! the single bounded prompt sent to the inference backend.

use crate::ports::{DatabaseService, PortError, PortResult, TextExtractor};
use uuid::Uuid;

/// Hard cap on the excerpt taken from each document, in characters.
pub const EXCERPT_CHAR_LIMIT: usize = 5000;

const PREAMBLE: &str = "You are a document analysis assistant focused on helping users \
understand paper and research documents, especially those related to \
Universitas Negeri Semarang (UNNES).";

const CLOSING_INSTRUCTION: &str =
    "Please provide a clear, concise answer based on the documents provided.";

/// The assembled prompt plus the filenames that actually made it in,
/// in their original order. The filenames are reported back to the client
/// as `source_documents`.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub prompt: String,
    pub source_documents: Vec<String>,
}

/// Builds the prompt for one chat turn.
///
/// Ids are resolved scoped to `owner`, in the order given, duplicates
/// allowed. Ids that do not resolve (absent or owned by someone else) are
/// silently dropped, as are documents whose extraction yields no text.
/// Each surviving excerpt is truncated to its first [`EXCERPT_CHAR_LIMIT`]
/// characters. Zero surviving documents still produces a valid prompt and
/// the model is still queried.
///
/// Storage-engine failures are the caller's fault to surface: they propagate
/// as errors rather than being swallowed.
pub async fn assemble(
    owner: &str,
    question: &str,
    document_ids: &[Uuid],
    db: &dyn DatabaseService,
    extractor: &dyn TextExtractor,
) -> PortResult<AssembledContext> {
    let mut excerpts: Vec<(String, String)> = Vec::new();
    for id in document_ids {
        let document = match db.resolve_document(owner, *id).await {
            Ok(document) => document,
            Err(PortError::NotFound(_)) => continue,
            Err(other) => return Err(other),
        };
        match extractor.extract(&document.storage_path).into_text() {
            Some(text) => excerpts.push((document.original_filename, text)),
            None => continue,
        }
    }

    let mut prompt = String::new();
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nUser's question: ");
    prompt.push_str(question);
    prompt.push_str("\n\n");
    prompt.push_str(if excerpts.is_empty() {
        "No documents provided."
    } else {
        "Documents provided:"
    });

    let mut source_documents = Vec::with_capacity(excerpts.len());
    for (index, (filename, text)) in excerpts.into_iter().enumerate() {
        let excerpt: String = text.chars().take(EXCERPT_CHAR_LIMIT).collect();
        prompt.push_str(&format!("\n\nDocument {} ({}):\n{}", index + 1, filename, excerpt));
        source_documents.push(filename);
    }

    prompt.push_str("\n\n");
    prompt.push_str(CLOSING_INSTRUCTION);

    Ok(AssembledContext {
        prompt,
        source_documents,
    })
}
