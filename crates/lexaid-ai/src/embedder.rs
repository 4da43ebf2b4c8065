//! Embedding client for an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use lexaid_core::{EmbeddingError, TextEmbedder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Upstream providers reject over-long inputs; anything beyond this is
/// truncated before submission.
pub const MAX_INPUT_CHARS: usize = 8000;

/// Remote embedding client.
///
/// Posts to `{base_url}/embeddings` with a bearer credential. No retry or
/// backoff here; callers decide whether a failure is worth repeating.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    /// Create a client for the given provider base URL (no trailing slash
    /// needed), model name, and credential.
    pub fn new(base_url: String, model: String, api_key: String, dim: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            dim,
        }
    }
}

#[async_trait]
impl TextEmbedder for RemoteEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = truncate_input(text);
        let url = format!("{}/embeddings", self.base_url);
        debug!(chars = input.len(), model = %self.model, "requesting embedding");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": input }))
            .send()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        let row = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Malformed("empty data array".into()))?;

        if row.embedding.len() != self.dim {
            return Err(EmbeddingError::Malformed(format!(
                "expected {} dimensions, got {}",
                self.dim,
                row.embedding.len()
            )));
        }
        Ok(row.embedding)
    }
}

/// Truncate to [`MAX_INPUT_CHARS`] bytes on a char boundary.
fn truncate_input(text: &str) -> &str {
    if text.len() <= MAX_INPUT_CHARS {
        return text;
    }
    let mut end = MAX_INPUT_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
