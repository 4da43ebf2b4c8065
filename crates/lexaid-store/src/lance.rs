//! LanceDB storage layer for the legal corpus.
//!
//! Four tables: `legal_sections`, `case_law`, `playbooks`, `templates`.
//! At runtime the store is a pure reader; `create_table_from_batches` exists
//! for the ingestion pipeline and for tests.

use std::path::Path;

use arrow::array::RecordBatchIterator;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use tracing::info;

use crate::StoreError;

pub const LEGAL_SECTIONS_TABLE: &str = "legal_sections";
pub const CASE_LAW_TABLE: &str = "case_law";
pub const PLAYBOOKS_TABLE: &str = "playbooks";
pub const TEMPLATES_TABLE: &str = "templates";

/// Read-only accessor over the corpus tables.
///
/// Wraps a single `lancedb::Connection`; LanceDB bounds and synchronises its
/// own I/O internally, so the handle is shared via `Arc` without extra
/// locking.
pub struct LanceStore {
    db: lancedb::Connection,
}

impl LanceStore {
    /// Connect to a LanceDB database at the given path.
    ///
    /// Creates the database directory if it doesn't exist.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self { db })
    }

    /// Equality-filtered scan of a table.
    ///
    /// `filter` is a SQL predicate (no `WHERE` keyword). Row order is the
    /// store's natural order.
    pub async fn scan(
        &self,
        table: &str,
        filter: &str,
        limit: usize,
    ) -> Result<Vec<RecordBatch>, StoreError> {
        let table = self.table(table).await?;
        let results: Vec<RecordBatch> = table
            .query()
            .only_if(filter)
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;
        Ok(results)
    }

    /// Cosine nearest-neighbour query with an optional scalar pre-filter.
    ///
    /// Returns up to `limit` rows ordered by ascending `_distance`. Rows with
    /// a null embedding are never candidates. The metric is pinned to cosine
    /// so `similarity = 1 - _distance` holds for callers.
    pub async fn nearest(
        &self,
        table: &str,
        query_vector: &[f32],
        filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RecordBatch>, StoreError> {
        let table = self.table(table).await?;
        let mut query = table
            .vector_search(query_vector)?
            .distance_type(DistanceType::Cosine)
            .limit(limit);
        if let Some(predicate) = filter {
            query = query.only_if(predicate);
        }
        let results: Vec<RecordBatch> = query.execute().await?.try_collect().await?;
        Ok(results)
    }

    /// Count rows in a table.
    pub async fn count(&self, table: &str) -> Result<usize, StoreError> {
        let table = self.table(table).await?;
        let count = table.count_rows(None).await?;
        Ok(count)
    }

    /// List table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let names = self.db.table_names().execute().await?;
        Ok(names)
    }

    /// Create (or replace) a table from pre-built RecordBatches.
    ///
    /// Used by the ingestion pipeline and by tests; no engine operation
    /// writes through this.
    pub async fn create_table_from_batches(
        &self,
        table_name: &str,
        batches: Vec<RecordBatch>,
    ) -> Result<(), StoreError> {
        if batches.is_empty() {
            return Err(StoreError::Other("no record batches provided".into()));
        }

        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let schema = batches[0].schema();
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        let existing = self.db.table_names().execute().await?;
        if existing.contains(&table_name.to_string()) {
            self.db.drop_table(table_name, &[]).await?;
        }

        self.db
            .create_table(table_name, Box::new(reader))
            .execute()
            .await?;

        info!(table = table_name, rows = total_rows, "created corpus table");
        Ok(())
    }

    // ── Internal ──

    async fn table(&self, name: &str) -> Result<lancedb::Table, StoreError> {
        let table = self.db.open_table(name).execute().await?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use lexaid_core::corpus::EMBED_DIM;
    use lexaid_core::{DocumentType, LegalSection, Template};
    use tempfile::TempDir;

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBED_DIM as usize];
        v[i] = 1.0;
        v
    }

    fn section(document_type: DocumentType, number: &str, title: &str) -> LegalSection {
        LegalSection {
            document_type,
            citation: "Consumer Affairs Authority Act, No. 9 of 2003".into(),
            section_number: number.into(),
            section_title: title.into(),
            section_text: format!("Text of section {number}."),
        }
    }

    async fn seeded_store(tmp: &TempDir) -> LanceStore {
        let store = LanceStore::open(&tmp.path().join("lexaid.lance"))
            .await
            .unwrap();

        let sections = vec![
            section(DocumentType::Statute, "14", "Unfair contract terms"),
            section(DocumentType::Statute, "21", "Warranties"),
            section(DocumentType::Rules, "14", "Service of documents"),
        ];
        let embeddings = vec![
            Some(axis(0)),
            Some(axis(1)),
            // Rules section left unembedded: reachable by exact lookup only.
            None,
        ];
        let batch = codec::sections_batch(&sections, &embeddings).unwrap();
        store
            .create_table_from_batches(LEGAL_SECTIONS_TABLE, vec![batch])
            .await
            .unwrap();

        store
    }

    #[tokio::test]
    async fn open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let store = LanceStore::open(&tmp.path().join("lexaid.lance"))
            .await
            .unwrap();
        let names = store.table_names().await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn create_and_count() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        assert_eq!(store.count(LEGAL_SECTIONS_TABLE).await.unwrap(), 3);
        let names = store.table_names().await.unwrap();
        assert!(names.contains(&LEGAL_SECTIONS_TABLE.to_string()));
    }

    #[tokio::test]
    async fn scan_applies_filter() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let batches = store
            .scan(
                LEGAL_SECTIONS_TABLE,
                "document_type = 'statute' AND section_number = '14'",
                16,
            )
            .await
            .unwrap();
        let sections = codec::decode_sections(&batches).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_title, "Unfair contract terms");
    }

    #[tokio::test]
    async fn nearest_orders_by_distance_and_respects_limit() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let batches = store
            .nearest(LEGAL_SECTIONS_TABLE, &axis(0), None, 1)
            .await
            .unwrap();
        let sections = codec::decode_sections(&batches).unwrap();
        let distances = codec::decode_distances(&batches).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_number, "14");
        assert!(distances[0] < 1e-5, "expected ~zero distance to own axis");
    }

    #[tokio::test]
    async fn nearest_applies_prefilter() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        // Nearest to axis(0) is the statute s.14 row, but the filter pins
        // the search to the other statute row.
        let batches = store
            .nearest(
                LEGAL_SECTIONS_TABLE,
                &axis(0),
                Some("section_number = '21'"),
                8,
            )
            .await
            .unwrap();
        let sections = codec::decode_sections(&batches).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_number, "21");
    }

    #[tokio::test]
    async fn nearest_skips_unembedded_rows() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let batches = store
            .nearest(LEGAL_SECTIONS_TABLE, &axis(2), None, 16)
            .await
            .unwrap();
        let sections = codec::decode_sections(&batches).unwrap();
        assert_eq!(sections.len(), 2, "null-embedding row must not surface");
        assert!(sections
            .iter()
            .all(|s| s.document_type == DocumentType::Statute));
    }

    #[tokio::test]
    async fn reload_replaces_table() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        let templates = vec![Template {
            template_type: "complaint_letter".into(),
            version: 1,
            is_active: true,
            content: "v1".into(),
        }];
        let batch = codec::templates_batch(&templates).unwrap();
        store
            .create_table_from_batches(TEMPLATES_TABLE, vec![batch.clone()])
            .await
            .unwrap();
        store
            .create_table_from_batches(TEMPLATES_TABLE, vec![batch])
            .await
            .unwrap();

        assert_eq!(store.count(TEMPLATES_TABLE).await.unwrap(), 1);
    }
}
