//! Corpus entity types.
//!
//! All entities are curated by an external ingestion pipeline; nothing in
//! this workspace creates, mutates, or deletes them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document family a legal section belongs to. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Statute,
    Rules,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Statute => "statute",
            DocumentType::Rules => "rules",
        }
    }

    pub fn parse(s: &str) -> Option<DocumentType> {
        match s {
            "statute" => Some(DocumentType::Statute),
            "rules" => Some(DocumentType::Rules),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One numbered section of a legal document.
///
/// The parent document is denormalised onto the row: `document_type` and
/// `citation` identify it. `section_number` is unique within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalSection {
    pub document_type: DocumentType,
    pub citation: String,
    pub section_number: String,
    pub section_title: String,
    pub section_text: String,
}

/// A decided case with its analytical breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLawEntry {
    pub case_name: String,
    pub citation: String,
    pub court: String,
    pub decided_date: NaiveDate,
    pub facts_summary: String,
    pub issues: String,
    pub holdings: String,
    pub ratio_decidendi: String,
    /// Section numbers the judgment interprets. Order irrelevant.
    pub sections_interpreted: Vec<String>,
}

/// Practitioner guidance for a recurring scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub title: String,
    pub category: String,
    pub scenario: String,
    pub recommended_approach: String,
    pub do_list: Vec<String>,
    pub dont_list: Vec<String>,
    pub legal_references: Vec<String>,
    pub difficulty_level: String,
}

/// A versioned document template. Retrieval returns the highest active
/// version per `template_type`; templates carry no embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub template_type: String,
    pub version: i32,
    pub is_active: bool,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_round_trip() {
        for dt in [DocumentType::Statute, DocumentType::Rules] {
            assert_eq!(DocumentType::parse(dt.as_str()), Some(dt));
        }
        assert_eq!(DocumentType::parse("regulation"), None);
    }

    #[test]
    fn document_type_serde_snake_case() {
        let json = serde_json::to_string(&DocumentType::Statute).unwrap();
        assert_eq!(json, r#""statute""#);
    }

    #[test]
    fn case_law_json_round_trip() {
        let entry = CaseLawEntry {
            case_name: "Perera v. National Savings Bank".into(),
            citation: "[2019] 2 SLR 114".into(),
            court: "Court of Appeal".into(),
            decided_date: NaiveDate::from_ymd_opt(2019, 6, 14).unwrap(),
            facts_summary: "Depositor alleged unauthorised withdrawals.".into(),
            issues: "Whether the bank owed a duty of verification.".into(),
            holdings: "Duty affirmed; bank liable.".into(),
            ratio_decidendi: "A paying bank must verify mandate authority.".into(),
            sections_interpreted: vec!["14".into(), "21A".into()],
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: CaseLawEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
        assert!(json.contains("2019-06-14"));
    }
}
