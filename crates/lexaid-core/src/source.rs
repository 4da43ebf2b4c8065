//! Searchable corpus collections.

use serde::{Deserialize, Serialize};

/// One of the logical collections the engine can search semantically.
///
/// Templates are not a semantic source; they are reached by exact lookup
/// only and carry no embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Statute,
    Rules,
    CaseLaw,
    Playbooks,
}

impl Source {
    /// All semantic sources, in the order multi-source fan-out visits them.
    pub const ALL: [Source; 4] = [
        Source::Statute,
        Source::Rules,
        Source::CaseLaw,
        Source::Playbooks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Statute => "statute",
            Source::Rules => "rules",
            Source::CaseLaw => "case_law",
            Source::Playbooks => "playbooks",
        }
    }

    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "statute" => Some(Source::Statute),
            "rules" => Some(Source::Rules),
            "case_law" => Some(Source::CaseLaw),
            "playbooks" => Some(Source::Playbooks),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
