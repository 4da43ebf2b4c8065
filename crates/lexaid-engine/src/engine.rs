//! Exact-then-semantic retrieval over the corpus.
//!
//! Exact structured lookups are authoritative: when a section-number key
//! matches, similarity ranking never reorders or dilutes the result. The
//! semantic path runs only when no key was given or the key missed.

use std::cmp::Ordering;
use std::sync::Arc;

use lexaid_core::{
    section_key, CaseLawEntry, DocumentType, LegalSection, Playbook, Source, Template,
    TextEmbedder,
};
use lexaid_store::{
    codec, LanceStore, CASE_LAW_TABLE, LEGAL_SECTIONS_TABLE, PLAYBOOKS_TABLE, TEMPLATES_TABLE,
};
use serde::Serialize;
use tracing::debug;

use crate::EngineError;

/// Active template rows per type are few; this bounds the scan all the same.
const TEMPLATE_SCAN_LIMIT: usize = 1024;

/// A retrieved row with provenance and ranking score.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub source: Source,
    /// `1 - cosine distance`. Absent on exact-path rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(flatten)]
    pub record: Record,
}

/// The entity behind a hit.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    Section(LegalSection),
    Case(CaseLawEntry),
    Playbook(Playbook),
}

/// Result set of one retrieval call.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    /// True exactly when `results` is non-empty. There is no
    /// minimum-similarity floor.
    pub found: bool,
    pub results: Vec<Hit>,
}

impl RetrievalOutcome {
    fn from_hits(results: Vec<Hit>) -> Self {
        Self {
            found: !results.is_empty(),
            results,
        }
    }
}

/// Hybrid retrieval engine. Holds the collaborators injected at startup;
/// no cross-call mutable state.
pub struct RetrievalEngine {
    store: Arc<LanceStore>,
    embedder: Arc<dyn TextEmbedder>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<LanceStore>, embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { store, embedder }
    }

    /// Search statute or rules sections.
    ///
    /// With `section_number`, an equality lookup on the canonicalised key
    /// (plus the document-type filter) wins outright; multi-row matches are
    /// ordered by section sort key. Otherwise, or on an exact miss, `query`
    /// is embedded and the nearest sections of that document type returned.
    pub async fn search_sections(
        &self,
        document_type: DocumentType,
        query: &str,
        section_number: Option<&str>,
        max_results: usize,
    ) -> Result<RetrievalOutcome, EngineError> {
        let source = match document_type {
            DocumentType::Statute => Source::Statute,
            DocumentType::Rules => Source::Rules,
        };

        if let Some(number) = section_number {
            let canonical = section_key::canonicalize(number);
            let filter = format!(
                "document_type = '{}' AND section_number = '{}'",
                document_type.as_str(),
                quote(&canonical)
            );
            let batches = self
                .store
                .scan(LEGAL_SECTIONS_TABLE, &filter, max_results)
                .await?;
            let mut sections = codec::decode_sections(&batches)?;
            if !sections.is_empty() {
                debug!(%source, number = %canonical, rows = sections.len(), "exact section lookup");
                sections.sort_by_key(|s| section_key::sort_key(&s.section_number));
                let hits = sections
                    .into_iter()
                    .map(|s| Hit {
                        source,
                        similarity: None,
                        record: Record::Section(s),
                    })
                    .collect();
                return Ok(RetrievalOutcome::from_hits(hits));
            }
            // Exact miss falls through to the semantic path.
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self
            .semantic_hits(source, &vector, None, max_results)
            .await?;
        Ok(RetrievalOutcome::from_hits(hits))
    }

    /// Case-law search, optionally pinned to judgments whose
    /// `sections_interpreted` set contains the given section number.
    pub async fn search_case_law(
        &self,
        query: &str,
        section: Option<&str>,
        max_results: usize,
    ) -> Result<RetrievalOutcome, EngineError> {
        let vector = self.embedder.embed(query).await?;
        let filter = section.map(|s| {
            format!(
                "array_has(sections_interpreted, '{}')",
                quote(&section_key::canonicalize(s))
            )
        });
        let hits = self
            .semantic_hits(Source::CaseLaw, &vector, filter.as_deref(), max_results)
            .await?;
        Ok(RetrievalOutcome::from_hits(hits))
    }

    /// Playbook search, optionally restricted to one category.
    pub async fn search_playbooks(
        &self,
        scenario: &str,
        category: Option<&str>,
        max_results: usize,
    ) -> Result<RetrievalOutcome, EngineError> {
        let vector = self.embedder.embed(scenario).await?;
        let filter = category.map(|c| format!("category = '{}'", quote(c)));
        let hits = self
            .semantic_hits(Source::Playbooks, &vector, filter.as_deref(), max_results)
            .await?;
        Ok(RetrievalOutcome::from_hits(hits))
    }

    /// Multi-source fan-out: the query is embedded once, each source is
    /// searched independently with the same per-source cap, and the merged
    /// list is re-ranked by similarity and truncated globally.
    ///
    /// Scores are compared across sources as-is; this presumes a shared
    /// embedding space, which the engine does not verify.
    pub async fn semantic_search(
        &self,
        query: &str,
        sources: &[Source],
        max_results: usize,
    ) -> Result<RetrievalOutcome, EngineError> {
        let vector = self.embedder.embed(query).await?;
        let mut merged = Vec::new();
        for &source in sources {
            let hits = self
                .semantic_hits(source, &vector, None, max_results)
                .await?;
            debug!(%source, rows = hits.len(), "fan-out source complete");
            merged.extend(hits);
        }
        // Stable sort: ties keep source-iteration order, then row order.
        merged.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        merged.truncate(max_results);
        Ok(RetrievalOutcome::from_hits(merged))
    }

    /// The current template for a type: the highest-version row among
    /// active ones. More than one active row is tolerated; version decides.
    pub async fn current_template(
        &self,
        template_type: &str,
    ) -> Result<Option<Template>, EngineError> {
        let filter = format!(
            "template_type = '{}' AND is_active = true",
            quote(template_type)
        );
        let batches = self
            .store
            .scan(TEMPLATES_TABLE, &filter, TEMPLATE_SCAN_LIMIT)
            .await?;
        let mut templates = codec::decode_templates(&batches)?;
        // Stable sort keeps row order between equal versions.
        templates.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(templates.into_iter().next())
    }

    // ── Internal ──

    /// Nearest-neighbour query against one source, decoded into hits with
    /// `similarity = 1 - cosine distance`.
    async fn semantic_hits(
        &self,
        source: Source,
        vector: &[f32],
        extra_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Hit>, EngineError> {
        let (table, base_filter) = match source {
            Source::Statute => (LEGAL_SECTIONS_TABLE, Some("document_type = 'statute'")),
            Source::Rules => (LEGAL_SECTIONS_TABLE, Some("document_type = 'rules'")),
            Source::CaseLaw => (CASE_LAW_TABLE, None),
            Source::Playbooks => (PLAYBOOKS_TABLE, None),
        };
        let filter = merge_filters(base_filter, extra_filter);
        let batches = self
            .store
            .nearest(table, vector, filter.as_deref(), limit)
            .await?;

        let records: Vec<Record> = match source {
            Source::Statute | Source::Rules => codec::decode_sections(&batches)?
                .into_iter()
                .map(Record::Section)
                .collect(),
            Source::CaseLaw => codec::decode_cases(&batches)?
                .into_iter()
                .map(Record::Case)
                .collect(),
            Source::Playbooks => codec::decode_playbooks(&batches)?
                .into_iter()
                .map(Record::Playbook)
                .collect(),
        };
        let distances = codec::decode_distances(&batches)?;

        Ok(records
            .into_iter()
            .zip(distances)
            .map(|(record, distance)| Hit {
                source,
                similarity: Some(1.0 - distance),
                record,
            })
            .collect())
    }
}

/// Escape a value for use inside a single-quoted SQL literal.
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn merge_filters(base: Option<&str>, extra: Option<&str>) -> Option<String> {
    match (base, extra) {
        (Some(b), Some(e)) => Some(format!("{b} AND {e}")),
        (Some(b), None) => Some(b.to_string()),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use lexaid_core::corpus::EMBED_DIM;
    use lexaid_core::EmbeddingError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    // ── Test embedders ──

    /// Maps known query strings to fixed vectors; unknown text errors like
    /// a provider rejecting the input.
    struct StubEmbedder {
        vectors: HashMap<&'static str, Vec<f32>>,
    }

    #[async_trait]
    impl TextEmbedder for StubEmbedder {
        fn dim(&self) -> usize {
            EMBED_DIM as usize
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| EmbeddingError::Provider {
                    status: 400,
                    body: format!("input rejected: {text:?}"),
                })
        }
    }

    /// Fails the test if the semantic path runs at all.
    struct PanicEmbedder;

    #[async_trait]
    impl TextEmbedder for PanicEmbedder {
        fn dim(&self) -> usize {
            EMBED_DIM as usize
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            panic!("semantic path must not run (tried to embed {text:?})");
        }
    }

    // ── Fixtures ──

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBED_DIM as usize];
        v[i] = 1.0;
        v
    }

    /// Unit vector with cosine `wi` against `axis(i)` and `wj` against
    /// `axis(j)`; callers pick weights with `wi² + wj² = 1`.
    fn blend(i: usize, wi: f32, j: usize, wj: f32) -> Vec<f32> {
        let mut v = vec![0.0; EMBED_DIM as usize];
        v[i] = wi;
        v[j] = wj;
        v
    }

    fn section(document_type: DocumentType, number: &str, title: &str) -> LegalSection {
        LegalSection {
            document_type,
            citation: match document_type {
                DocumentType::Statute => "Consumer Affairs Authority Act, No. 9 of 2003".into(),
                DocumentType::Rules => "Consumer Dispute Rules of 2005".into(),
            },
            section_number: number.into(),
            section_title: title.into(),
            section_text: format!("Text of section {number}."),
        }
    }

    fn case(name: &str, sections: &[&str]) -> CaseLawEntry {
        CaseLawEntry {
            case_name: name.into(),
            citation: "[2018] 1 SLR 77".into(),
            court: "Court of Appeal".into(),
            decided_date: NaiveDate::from_ymd_opt(2018, 9, 3).unwrap(),
            facts_summary: "Summary.".into(),
            issues: "Issues.".into(),
            holdings: "Holdings.".into(),
            ratio_decidendi: "Ratio.".into(),
            sections_interpreted: sections.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn playbook(title: &str, category: &str) -> Playbook {
        Playbook {
            title: title.into(),
            category: category.into(),
            scenario: "Scenario.".into(),
            recommended_approach: "Approach.".into(),
            do_list: vec!["document everything".into()],
            dont_list: vec!["do not admit liability".into()],
            legal_references: vec!["s.14".into()],
            difficulty_level: "intermediate".into(),
        }
    }

    fn template(template_type: &str, version: i32, is_active: bool) -> Template {
        Template {
            template_type: template_type.into(),
            version,
            is_active,
            content: format!("{template_type} v{version}"),
        }
    }

    async fn seeded_engine(tmp: &TempDir, embedder: Arc<dyn TextEmbedder>) -> RetrievalEngine {
        let store = LanceStore::open(&tmp.path().join("lexaid.lance"))
            .await
            .unwrap();

        let sections = vec![
            section(DocumentType::Statute, "14", "Unfair contract terms"),
            section(DocumentType::Statute, "21", "Implied warranties"),
            section(DocumentType::Statute, "21A", "Warranty claims procedure"),
            section(DocumentType::Rules, "14", "Service of documents"),
        ];
        let section_embeddings = vec![
            Some(axis(0)),
            Some(blend(0, 0.8, 1, 0.6)),
            // No embedding: reachable by exact lookup only.
            None,
            Some(axis(1)),
        ];
        store
            .create_table_from_batches(
                LEGAL_SECTIONS_TABLE,
                vec![codec::sections_batch(&sections, &section_embeddings).unwrap()],
            )
            .await
            .unwrap();

        let cases = vec![
            case("Perera v. Lanka Appliances", &["14", "21A"]),
            case("Fernando v. Ceylon Electricity Board", &["32"]),
        ];
        let case_embeddings = vec![Some(blend(0, 0.6, 1, 0.8)), Some(axis(0))];
        store
            .create_table_from_batches(
                CASE_LAW_TABLE,
                vec![codec::cases_batch(&cases, &case_embeddings).unwrap()],
            )
            .await
            .unwrap();

        let playbooks = vec![
            playbook("Handling warranty refusals", "warranty"),
            playbook("Disputing utility bills", "billing"),
        ];
        let playbook_embeddings = vec![Some(axis(0)), Some(axis(1))];
        store
            .create_table_from_batches(
                PLAYBOOKS_TABLE,
                vec![codec::playbooks_batch(&playbooks, &playbook_embeddings).unwrap()],
            )
            .await
            .unwrap();

        let templates = vec![
            template("complaint_letter", 1, false),
            template("complaint_letter", 2, true),
            template("complaint_letter", 3, true),
            template("complaint_letter", 4, false),
            template("demand_notice", 1, true),
        ];
        store
            .create_table_from_batches(
                TEMPLATES_TABLE,
                vec![codec::templates_batch(&templates).unwrap()],
            )
            .await
            .unwrap();

        RetrievalEngine::new(Arc::new(store), embedder)
    }

    fn stub() -> Arc<dyn TextEmbedder> {
        let mut vectors = HashMap::new();
        vectors.insert("unfair contract terms", axis(0));
        vectors.insert("warranty duration", axis(1));
        vectors.insert("disconnection without notice", axis(0));
        vectors.insert("billing dispute", axis(1));
        Arc::new(StubEmbedder { vectors })
    }

    fn similarities(outcome: &RetrievalOutcome) -> Vec<f32> {
        outcome
            .results
            .iter()
            .map(|h| h.similarity.expect("semantic hit must carry similarity"))
            .collect()
    }

    fn section_numbers(outcome: &RetrievalOutcome) -> Vec<String> {
        outcome
            .results
            .iter()
            .map(|h| match &h.record {
                Record::Section(s) => s.section_number.clone(),
                other => panic!("expected section record, got {other:?}"),
            })
            .collect()
    }

    // ── Exact path ──

    #[tokio::test]
    async fn exact_lookup_returns_key_match_and_skips_semantic() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, Arc::new(PanicEmbedder)).await;

        let outcome = engine
            .search_sections(DocumentType::Statute, "anything at all", Some("14"), 5)
            .await
            .unwrap();

        assert!(outcome.found);
        assert_eq!(section_numbers(&outcome), vec!["14"]);
        assert!(outcome.results[0].similarity.is_none());
        assert_eq!(outcome.results[0].source, Source::Statute);
    }

    #[tokio::test]
    async fn exact_lookup_canonicalises_key_and_reaches_unembedded_rows() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, Arc::new(PanicEmbedder)).await;

        let outcome = engine
            .search_sections(DocumentType::Statute, "ignored", Some(" 21a "), 5)
            .await
            .unwrap();

        assert!(outcome.found);
        assert_eq!(section_numbers(&outcome), vec!["21A"]);
    }

    #[tokio::test]
    async fn exact_lookup_respects_document_type_filter() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, Arc::new(PanicEmbedder)).await;

        let outcome = engine
            .search_sections(DocumentType::Rules, "ignored", Some("14"), 5)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        match &outcome.results[0].record {
            Record::Section(s) => assert_eq!(s.document_type, DocumentType::Rules),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn exact_miss_falls_back_to_semantic() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .search_sections(DocumentType::Statute, "unfair contract terms", Some("999"), 5)
            .await
            .unwrap();

        assert!(outcome.found);
        assert_eq!(section_numbers(&outcome), vec!["14", "21"]);
        assert!(outcome.results.iter().all(|h| h.similarity.is_some()));
    }

    // ── Semantic path ──

    #[tokio::test]
    async fn semantic_orders_by_descending_similarity() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .search_sections(DocumentType::Statute, "unfair contract terms", None, 5)
            .await
            .unwrap();

        assert!(outcome.found);
        // Unembedded s.21A and the rules document never surface.
        assert_eq!(section_numbers(&outcome), vec!["14", "21"]);
        let sims = similarities(&outcome);
        for pair in sims.windows(2) {
            assert!(pair[0] >= pair[1], "similarities not monotonic: {sims:?}");
        }
        assert!((sims[0] - 1.0).abs() < 1e-4);
        assert!((sims[1] - 0.8).abs() < 1e-4);
    }

    #[tokio::test]
    async fn max_results_bound_respected() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .search_sections(DocumentType::Statute, "unfair contract terms", None, 1)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(section_numbers(&outcome), vec!["14"]);
    }

    #[tokio::test]
    async fn case_law_section_filter_is_membership() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        // Nearest case to this query is Fernando, but it does not interpret
        // s.14; the filter must pin the result to Perera.
        let outcome = engine
            .search_case_law("disconnection without notice", Some("14"), 3)
            .await
            .unwrap();

        assert!(outcome.found);
        assert_eq!(outcome.results.len(), 1);
        match &outcome.results[0].record {
            Record::Case(c) => {
                assert_eq!(c.case_name, "Perera v. Lanka Appliances");
                assert!(c.sections_interpreted.contains(&"14".to_string()));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn found_false_with_empty_results() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .search_case_law("disconnection without notice", Some("999"), 3)
            .await
            .unwrap();

        assert!(!outcome.found);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn playbook_category_filter() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        // Query vector sits on the billing playbook; the category filter
        // still forces the warranty one.
        let outcome = engine
            .search_playbooks("billing dispute", Some("warranty"), 3)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        match &outcome.results[0].record {
            Record::Playbook(p) => assert_eq!(p.category, "warranty"),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_query_surfaces_embedding_error() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let err = engine
            .search_sections(DocumentType::Statute, "", None, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Embedding(_)));
    }

    // ── Multi-source fan-out ──

    #[tokio::test]
    async fn fan_out_merges_ranks_and_truncates() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .semantic_search("unfair contract terms", &Source::ALL, 5)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 5);
        let sims = similarities(&outcome);
        for pair in sims.windows(2) {
            assert!(pair[0] >= pair[1], "similarities not monotonic: {sims:?}");
        }
        // Three full-score ties keep source iteration order: statute,
        // case_law, playbooks.
        let sources: Vec<Source> = outcome.results.iter().map(|h| h.source).collect();
        assert_eq!(
            &sources[..3],
            &[Source::Statute, Source::CaseLaw, Source::Playbooks]
        );
        assert!((sims[2] - 1.0).abs() < 1e-4);
        assert!(sims[3] < 1.0);
    }

    #[tokio::test]
    async fn fan_out_isolates_requested_sources() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .semantic_search("unfair contract terms", &[Source::Statute], 5)
            .await
            .unwrap();

        assert!(outcome.found);
        assert!(outcome.results.iter().all(|h| h.source == Source::Statute));
        assert!(outcome
            .results
            .iter()
            .all(|h| matches!(h.record, Record::Section(_))));
    }

    #[tokio::test]
    async fn fan_out_with_no_sources_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, stub()).await;

        let outcome = engine
            .semantic_search("unfair contract terms", &[], 5)
            .await
            .unwrap();

        assert!(!outcome.found);
        assert!(outcome.results.is_empty());
    }

    // ── Templates ──

    #[tokio::test]
    async fn current_template_is_highest_active_version() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, Arc::new(PanicEmbedder)).await;

        let template = engine
            .current_template("complaint_letter")
            .await
            .unwrap()
            .expect("template expected");

        // v4 exists but is inactive; v3 is the current version.
        assert_eq!(template.version, 3);
        assert!(template.is_active);
    }

    #[tokio::test]
    async fn unknown_template_type_is_none() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded_engine(&tmp, Arc::new(PanicEmbedder)).await;

        let template = engine.current_template("affidavit").await.unwrap();
        assert!(template.is_none());
    }

    // ── Filter building ──

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote("O'Brien"), "O''Brien");
        assert_eq!(quote("14"), "14");
    }

    #[test]
    fn merge_filters_combinations() {
        assert_eq!(
            merge_filters(Some("a = 1"), Some("b = 2")).as_deref(),
            Some("a = 1 AND b = 2")
        );
        assert_eq!(merge_filters(Some("a = 1"), None).as_deref(), Some("a = 1"));
        assert_eq!(merge_filters(None, Some("b = 2")).as_deref(), Some("b = 2"));
        assert_eq!(merge_filters(None, None), None);
    }
}
