//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::documents::DocumentRepository;
use crate::tokens::TokenIssuer;
use doc_chat_core::ports::{DatabaseService, InferenceService, TextExtractor};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub documents: Arc<DocumentRepository>,
    pub extractor: Arc<dyn TextExtractor>,
    pub llm: Arc<dyn InferenceService>,
    pub tokens: TokenIssuer,
    pub config: Arc<Config>,
}
