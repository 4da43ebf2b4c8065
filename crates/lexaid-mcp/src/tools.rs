//! Static tool catalog published through `tools/list`.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// A published tool: name, human-readable description, JSON Schema for its
/// arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool names, used by the catalog and the request parser alike.
pub mod names {
    pub const SEARCH_STATUTE_PROVISIONS: &str = "search_statute_provisions";
    pub const SEARCH_RULES_PROVISIONS: &str = "search_rules_provisions";
    pub const GET_CASE_LAW: &str = "get_case_law";
    pub const GET_PLAYBOOK_GUIDANCE: &str = "get_playbook_guidance";
    pub const GET_TEMPLATE: &str = "get_template";
    pub const CHECK_COMPLIANCE: &str = "check_compliance";
    pub const SEMANTIC_SEARCH: &str = "semantic_search";
}

/// The full catalog. Static and side-effect free: every call returns the
/// same definitions.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            names::SEARCH_STATUTE_PROVISIONS,
            "Search statute sections. An exact section_number lookup takes \
             precedence; otherwise the query is matched semantically.",
            provisions_schema("statute"),
        ),
        ToolDefinition::new(
            names::SEARCH_RULES_PROVISIONS,
            "Search procedural-rules sections. An exact section_number lookup \
             takes precedence; otherwise the query is matched semantically.",
            provisions_schema("rules"),
        ),
        ToolDefinition::new(
            names::GET_CASE_LAW,
            "Find decided cases relevant to a query, optionally restricted to \
             judgments interpreting a given section number.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Factual or legal situation to match against case summaries"
                    },
                    "section": {
                        "type": "string",
                        "description": "Only return cases whose interpreted sections include this number"
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 3
                    }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            names::GET_PLAYBOOK_GUIDANCE,
            "Retrieve practitioner playbooks matching a scenario, optionally \
             within one category.",
            json!({
                "type": "object",
                "properties": {
                    "scenario": {
                        "type": "string",
                        "description": "The situation to find guidance for"
                    },
                    "category": {
                        "type": "string",
                        "description": "Playbook category to restrict the search to"
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 3
                    }
                },
                "required": ["scenario"]
            }),
        ),
        ToolDefinition::new(
            names::GET_TEMPLATE,
            "Fetch the current (highest active version) document template of a \
             given type.",
            json!({
                "type": "object",
                "properties": {
                    "template_type": {
                        "type": "string",
                        "description": "Template type key, e.g. complaint_letter"
                    },
                    "case_code": {
                        "type": "string",
                        "description": "Echoed back for correlation; not used for retrieval"
                    }
                },
                "required": ["template_type"]
            }),
        ),
        ToolDefinition::new(
            names::CHECK_COMPLIANCE,
            "Run a compliance check. Not yet implemented; echoes the request \
             with a pending status.",
            json!({
                "type": "object",
                "properties": {
                    "check_type": { "type": "string" },
                    "case_code": { "type": "string" },
                    "organization_id": { "type": "string" }
                },
                "required": ["check_type"]
            }),
        ),
        ToolDefinition::new(
            names::SEMANTIC_SEARCH,
            "Semantic search across the corpus. Searches each requested source \
             independently, then merges and re-ranks by similarity.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "sources": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["statute", "rules", "case_law", "playbooks"]
                        },
                        "description": "Sources to search; defaults to all"
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 5
                    }
                },
                "required": ["query"]
            }),
        ),
    ]
}

fn provisions_schema(document_kind: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": format!("Free-text description of the {document_kind} provision sought")
            },
            "section_number": {
                "type": "string",
                "description": "Exact section number; when it matches, semantic search is skipped"
            },
            "max_results": {
                "type": "integer",
                "minimum": 1,
                "default": 5
            }
        },
        "required": ["query"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_seven_tools() {
        assert_eq!(definitions().len(), 7);
    }

    #[test]
    fn catalog_is_reproducible() {
        assert_eq!(definitions(), definitions());
    }

    #[test]
    fn every_tool_declares_required_fields() {
        for tool in definitions() {
            let required = tool.input_schema.get("required").unwrap_or_else(|| {
                panic!("{} has no required list", tool.name);
            });
            assert!(
                !required.as_array().unwrap().is_empty(),
                "{} requires nothing",
                tool.name
            );
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<String> = definitions().into_iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}
