pub mod db;
pub mod extract;
pub mod llm;

pub use db::DbAdapter;
pub use extract::FileTextExtractor;
pub use llm::LmStudioGateway;
