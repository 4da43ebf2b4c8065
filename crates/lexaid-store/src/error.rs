use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("column {0} missing or has unexpected type")]
    Column(String),

    #[error("{0}")]
    Other(String),
}
