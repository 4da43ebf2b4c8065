pub mod embed;
pub mod entities;
pub mod schema;
pub mod section_key;
pub mod source;

pub use embed::{EmbeddingError, TextEmbedder};
pub use entities::{CaseLawEntry, DocumentType, LegalSection, Playbook, Template};
pub use schema::corpus;
pub use source::Source;
