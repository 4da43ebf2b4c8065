//! Embedding collaborator seam.

use async_trait::async_trait;
use thiserror::Error;

/// Failure from the embedding provider, collapsed to one typed error so
/// callers need not know the transport.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Transport(String),

    #[error("embedding provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

/// Converts text to a fixed-length vector. The model behind it is opaque;
/// no retry or backoff is performed at this seam.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
