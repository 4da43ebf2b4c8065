//! Hybrid retrieval engine: exact structured lookup first, semantic fallback.

mod engine;
pub use engine::{Hit, Record, RetrievalEngine, RetrievalOutcome};

mod error;
pub use error::EngineError;
