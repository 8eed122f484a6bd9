pub mod context;
pub mod domain;
pub mod ports;

pub use context::{assemble, AssembledContext, EXCERPT_CHAR_LIMIT};
pub use domain::{ChatTurn, Document, UserCredentials};
pub use ports::{
    DatabaseService, Extraction, InferenceOutcome, InferenceService, PortError, PortResult,
    TextExtractor,
};
