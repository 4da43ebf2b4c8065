//! AI inference layer: remote text-embedding client.

mod embedder;
pub use embedder::{RemoteEmbedder, MAX_INPUT_CHARS};
