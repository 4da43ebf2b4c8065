use lexaid_core::EmbeddingError;
use lexaid_store::StoreError;
use thiserror::Error;

/// Typed failures surfaced to the dispatcher. The engine performs no
/// internal retry; soft misses are `found=false`, not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("embedding service error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("datastore error: {0}")]
    Datastore(#[from] StoreError),
}
