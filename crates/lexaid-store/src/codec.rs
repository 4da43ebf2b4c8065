//! Arrow encoding/decoding between corpus entities and RecordBatches.
//!
//! Decoding tolerates both `Utf8` and `LargeUtf8` text columns, since the
//! ingestion pipeline is free to write either. Embedding columns are never
//! decoded; retrieval results carry entities, not vectors.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, FixedSizeListBuilder, Float32Array, Float32Builder,
    Int32Array, LargeStringArray, ListArray, ListBuilder, StringArray, StringBuilder,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use lexaid_core::corpus;
use lexaid_core::{CaseLawEntry, DocumentType, LegalSection, Playbook, Template};

use crate::StoreError;

// ── Decoding ──

/// Decode `legal_sections` rows.
pub fn decode_sections(batches: &[RecordBatch]) -> Result<Vec<LegalSection>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            let raw = utf8_value(batch, "document_type", row)?;
            let document_type = DocumentType::parse(&raw)
                .ok_or_else(|| StoreError::Other(format!("unknown document_type: {raw}")))?;
            out.push(LegalSection {
                document_type,
                citation: utf8_value(batch, "citation", row)?,
                section_number: utf8_value(batch, "section_number", row)?,
                section_title: utf8_value(batch, "section_title", row)?,
                section_text: utf8_value(batch, "section_text", row)?,
            });
        }
    }
    Ok(out)
}

/// Decode `case_law` rows.
pub fn decode_cases(batches: &[RecordBatch]) -> Result<Vec<CaseLawEntry>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            out.push(CaseLawEntry {
                case_name: utf8_value(batch, "case_name", row)?,
                citation: utf8_value(batch, "citation", row)?,
                court: utf8_value(batch, "court", row)?,
                decided_date: date_value(batch, "decided_date", row)?,
                facts_summary: utf8_value(batch, "facts_summary", row)?,
                issues: utf8_value(batch, "issues", row)?,
                holdings: utf8_value(batch, "holdings", row)?,
                ratio_decidendi: utf8_value(batch, "ratio_decidendi", row)?,
                sections_interpreted: string_list(batch, "sections_interpreted", row)?,
            });
        }
    }
    Ok(out)
}

/// Decode `playbooks` rows.
pub fn decode_playbooks(batches: &[RecordBatch]) -> Result<Vec<Playbook>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            out.push(Playbook {
                title: utf8_value(batch, "title", row)?,
                category: utf8_value(batch, "category", row)?,
                scenario: utf8_value(batch, "scenario", row)?,
                recommended_approach: utf8_value(batch, "recommended_approach", row)?,
                do_list: string_list(batch, "do_list", row)?,
                dont_list: string_list(batch, "dont_list", row)?,
                legal_references: string_list(batch, "legal_references", row)?,
                difficulty_level: utf8_value(batch, "difficulty_level", row)?,
            });
        }
    }
    Ok(out)
}

/// Decode `templates` rows.
pub fn decode_templates(batches: &[RecordBatch]) -> Result<Vec<Template>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            out.push(Template {
                template_type: utf8_value(batch, "template_type", row)?,
                version: i32_value(batch, "version", row)?,
                is_active: bool_value(batch, "is_active", row)?,
                content: utf8_value(batch, "content", row)?,
            });
        }
    }
    Ok(out)
}

/// Per-row `_distance` values from a nearest-neighbour result, in row order.
pub fn decode_distances(batches: &[RecordBatch]) -> Result<Vec<f32>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        let col = column(batch, "_distance")?;
        let arr = col
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| StoreError::Column("_distance".into()))?;
        for row in 0..arr.len() {
            out.push(arr.value(row));
        }
    }
    Ok(out)
}

// ── Encoding ──

/// Build a `legal_sections` RecordBatch. One embedding slot per section;
/// `None` leaves the row unembedded (exact-lookup reachable only).
pub fn sections_batch(
    sections: &[LegalSection],
    embeddings: &[Option<Vec<f32>>],
) -> Result<RecordBatch, StoreError> {
    check_embedding_slots(sections.len(), embeddings.len())?;
    let schema = Arc::new(corpus::legal_sections_schema());
    let columns: Vec<ArrayRef> = vec![
        utf8_column(sections.iter().map(|s| s.document_type.as_str().to_string())),
        utf8_column(sections.iter().map(|s| s.citation.clone())),
        utf8_column(sections.iter().map(|s| s.section_number.clone())),
        utf8_column(sections.iter().map(|s| s.section_title.clone())),
        utf8_column(sections.iter().map(|s| s.section_text.clone())),
        embedding_column(embeddings)?,
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Build a `case_law` RecordBatch.
pub fn cases_batch(
    cases: &[CaseLawEntry],
    embeddings: &[Option<Vec<f32>>],
) -> Result<RecordBatch, StoreError> {
    check_embedding_slots(cases.len(), embeddings.len())?;
    let schema = Arc::new(corpus::case_law_schema());
    let columns: Vec<ArrayRef> = vec![
        utf8_column(cases.iter().map(|c| c.case_name.clone())),
        utf8_column(cases.iter().map(|c| c.citation.clone())),
        utf8_column(cases.iter().map(|c| c.court.clone())),
        utf8_column(cases.iter().map(|c| c.decided_date.to_string())),
        utf8_column(cases.iter().map(|c| c.facts_summary.clone())),
        utf8_column(cases.iter().map(|c| c.issues.clone())),
        utf8_column(cases.iter().map(|c| c.holdings.clone())),
        utf8_column(cases.iter().map(|c| c.ratio_decidendi.clone())),
        string_list_column(cases.iter().map(|c| c.sections_interpreted.as_slice())),
        embedding_column(embeddings)?,
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Build a `playbooks` RecordBatch.
pub fn playbooks_batch(
    playbooks: &[Playbook],
    embeddings: &[Option<Vec<f32>>],
) -> Result<RecordBatch, StoreError> {
    check_embedding_slots(playbooks.len(), embeddings.len())?;
    let schema = Arc::new(corpus::playbooks_schema());
    let columns: Vec<ArrayRef> = vec![
        utf8_column(playbooks.iter().map(|p| p.title.clone())),
        utf8_column(playbooks.iter().map(|p| p.category.clone())),
        utf8_column(playbooks.iter().map(|p| p.scenario.clone())),
        utf8_column(playbooks.iter().map(|p| p.recommended_approach.clone())),
        string_list_column(playbooks.iter().map(|p| p.do_list.as_slice())),
        string_list_column(playbooks.iter().map(|p| p.dont_list.as_slice())),
        string_list_column(playbooks.iter().map(|p| p.legal_references.as_slice())),
        utf8_column(playbooks.iter().map(|p| p.difficulty_level.clone())),
        embedding_column(embeddings)?,
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Build a `templates` RecordBatch.
pub fn templates_batch(templates: &[Template]) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(corpus::templates_schema());
    let columns: Vec<ArrayRef> = vec![
        utf8_column(templates.iter().map(|t| t.template_type.clone())),
        Arc::new(Int32Array::from(
            templates.iter().map(|t| t.version).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            templates.iter().map(|t| t.is_active).collect::<Vec<_>>(),
        )),
        utf8_column(templates.iter().map(|t| t.content.clone())),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

// ── Column helpers ──

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Column(name.to_string()))
}

/// Read a string cell from a `Utf8` or `LargeUtf8` column.
fn utf8_value(batch: &RecordBatch, name: &str, row: usize) -> Result<String, StoreError> {
    let col = column(batch, name)?;
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Ok(arr.value(row).to_string());
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(arr.value(row).to_string());
    }
    Err(StoreError::Column(name.to_string()))
}

fn i32_value(batch: &RecordBatch, name: &str, row: usize) -> Result<i32, StoreError> {
    let col = column(batch, name)?;
    col.as_any()
        .downcast_ref::<Int32Array>()
        .map(|arr| arr.value(row))
        .ok_or_else(|| StoreError::Column(name.to_string()))
}

fn bool_value(batch: &RecordBatch, name: &str, row: usize) -> Result<bool, StoreError> {
    let col = column(batch, name)?;
    col.as_any()
        .downcast_ref::<BooleanArray>()
        .map(|arr| arr.value(row))
        .ok_or_else(|| StoreError::Column(name.to_string()))
}

fn date_value(batch: &RecordBatch, name: &str, row: usize) -> Result<NaiveDate, StoreError> {
    let raw = utf8_value(batch, name, row)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| StoreError::Other(format!("bad date in {name}: {e}")))
}

fn string_list(batch: &RecordBatch, name: &str, row: usize) -> Result<Vec<String>, StoreError> {
    let col = column(batch, name)?;
    let list = col
        .as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| StoreError::Column(name.to_string()))?;
    let values = list.value(row);
    let strings = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StoreError::Column(name.to_string()))?;
    Ok((0..strings.len())
        .filter(|&i| !strings.is_null(i))
        .map(|i| strings.value(i).to_string())
        .collect())
}

fn utf8_column<I: IntoIterator<Item = String>>(values: I) -> ArrayRef {
    Arc::new(StringArray::from(values.into_iter().collect::<Vec<_>>()))
}

fn string_list_column<'a, I: IntoIterator<Item = &'a [String]>>(rows: I) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for items in rows {
        for item in items {
            builder.values().append_value(item);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn embedding_column(embeddings: &[Option<Vec<f32>>]) -> Result<ArrayRef, StoreError> {
    let mut builder = FixedSizeListBuilder::new(Float32Builder::new(), corpus::EMBED_DIM);
    for slot in embeddings {
        match slot {
            Some(vector) => {
                if vector.len() != corpus::EMBED_DIM as usize {
                    return Err(StoreError::Other(format!(
                        "embedding has {} dimensions, expected {}",
                        vector.len(),
                        corpus::EMBED_DIM
                    )));
                }
                builder.values().append_slice(vector);
                builder.append(true);
            }
            None => {
                builder.values().append_nulls(corpus::EMBED_DIM as usize);
                builder.append(false);
            }
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn check_embedding_slots(rows: usize, slots: usize) -> Result<(), StoreError> {
    if rows != slots {
        return Err(StoreError::Other(format!(
            "{rows} rows but {slots} embedding slots"
        )));
    }
    Ok(())
}
