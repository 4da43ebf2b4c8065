//! Storage layer: read-only LanceDB access to the externally-curated corpus.

mod error;
pub use error::StoreError;

pub mod codec;

mod lance;
pub use lance::{
    LanceStore, CASE_LAW_TABLE, LEGAL_SECTIONS_TABLE, PLAYBOOKS_TABLE, TEMPLATES_TABLE,
};
