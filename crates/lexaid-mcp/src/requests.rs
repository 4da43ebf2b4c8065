//! Typed tool requests, validated against the published schemas before any
//! engine work happens.
//!
//! Each catalog tool has its own argument struct; unknown fields are
//! rejected, missing required fields fail deserialization, and defaults are
//! applied here rather than deep in the engine.

use lexaid_core::Source;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::tools::names;

/// A tool call whose arguments did not match the published schema.
#[derive(Debug, Error)]
#[error("invalid arguments for {tool}: {message}")]
pub struct ArgumentValidationError {
    pub tool: &'static str,
    pub message: String,
}

fn default_provision_limit() -> usize {
    5
}

fn default_case_law_limit() -> usize {
    3
}

fn default_playbook_limit() -> usize {
    3
}

fn default_semantic_limit() -> usize {
    5
}

fn all_sources() -> Vec<Source> {
    Source::ALL.to_vec()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionsArgs {
    pub query: String,
    pub section_number: Option<String>,
    #[serde(default = "default_provision_limit")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseLawArgs {
    pub query: String,
    pub section: Option<String>,
    #[serde(default = "default_case_law_limit")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybookArgs {
    pub scenario: String,
    pub category: Option<String>,
    #[serde(default = "default_playbook_limit")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateArgs {
    pub template_type: String,
    /// Pass-through correlation key; never used for retrieval.
    pub case_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceArgs {
    pub check_type: String,
    pub case_code: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticSearchArgs {
    pub query: String,
    #[serde(default = "all_sources")]
    pub sources: Vec<Source>,
    #[serde(default = "default_semantic_limit")]
    pub max_results: usize,
}

/// One variant per catalog tool.
#[derive(Debug, Clone)]
pub enum ToolRequest {
    StatuteProvisions(ProvisionsArgs),
    RulesProvisions(ProvisionsArgs),
    CaseLaw(CaseLawArgs),
    Playbook(PlaybookArgs),
    Template(TemplateArgs),
    Compliance(ComplianceArgs),
    Semantic(SemanticSearchArgs),
}

impl ToolRequest {
    /// Validate `arguments` for the named tool. `None` means the name is
    /// not in the catalog at all.
    pub fn parse(
        name: &str,
        arguments: &Value,
    ) -> Option<Result<ToolRequest, ArgumentValidationError>> {
        let parsed = match name {
            names::SEARCH_STATUTE_PROVISIONS => {
                parse_args::<ProvisionsArgs>(names::SEARCH_STATUTE_PROVISIONS, arguments)
                    .and_then(|args| {
                        check_limit(names::SEARCH_STATUTE_PROVISIONS, args.max_results)
                            .map(|_| ToolRequest::StatuteProvisions(args))
                    })
            }
            names::SEARCH_RULES_PROVISIONS => {
                parse_args::<ProvisionsArgs>(names::SEARCH_RULES_PROVISIONS, arguments).and_then(
                    |args| {
                        check_limit(names::SEARCH_RULES_PROVISIONS, args.max_results)
                            .map(|_| ToolRequest::RulesProvisions(args))
                    },
                )
            }
            names::GET_CASE_LAW => {
                parse_args::<CaseLawArgs>(names::GET_CASE_LAW, arguments).and_then(|args| {
                    check_limit(names::GET_CASE_LAW, args.max_results)
                        .map(|_| ToolRequest::CaseLaw(args))
                })
            }
            names::GET_PLAYBOOK_GUIDANCE => {
                parse_args::<PlaybookArgs>(names::GET_PLAYBOOK_GUIDANCE, arguments).and_then(
                    |args| {
                        check_limit(names::GET_PLAYBOOK_GUIDANCE, args.max_results)
                            .map(|_| ToolRequest::Playbook(args))
                    },
                )
            }
            names::GET_TEMPLATE => {
                parse_args(names::GET_TEMPLATE, arguments).map(ToolRequest::Template)
            }
            names::CHECK_COMPLIANCE => {
                parse_args(names::CHECK_COMPLIANCE, arguments).map(ToolRequest::Compliance)
            }
            names::SEMANTIC_SEARCH => {
                parse_args::<SemanticSearchArgs>(names::SEMANTIC_SEARCH, arguments).and_then(
                    |args| {
                        check_limit(names::SEMANTIC_SEARCH, args.max_results)
                            .map(|_| ToolRequest::Semantic(args))
                    },
                )
            }
            _ => return None,
        };
        Some(parsed)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &'static str,
    arguments: &Value,
) -> Result<T, ArgumentValidationError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ArgumentValidationError {
        tool,
        message: e.to_string(),
    })
}

/// `max_results` accepts overrides down to 1; nothing is silently clamped.
fn check_limit(tool: &'static str, max_results: usize) -> Result<(), ArgumentValidationError> {
    if max_results == 0 {
        return Err(ArgumentValidationError {
            tool,
            message: "max_results must be at least 1".into(),
        });
    }
    Ok(())
}
