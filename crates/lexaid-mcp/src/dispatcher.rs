//! Tool dispatch: catalog lookup, argument validation, engine invocation,
//! and uniform response envelopes.
//!
//! Every failure below this boundary, including collaborator errors and the
//! per-call timeout, becomes an `is_error` response; nothing propagates out
//! and the process keeps serving subsequent calls.

use std::sync::Arc;
use std::time::Duration;

use lexaid_core::DocumentType;
use lexaid_engine::{EngineError, RetrievalEngine};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::requests::{ArgumentValidationError, ComplianceArgs, TemplateArgs, ToolRequest};
use crate::tools::{definitions, ToolDefinition};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// One content block of a tool response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ContentBlock {
    fn text(text: String) -> Self {
        Self { kind: "text", text }
    }
}

/// Uniform tool-call envelope: one text block carrying the serialized
/// structured result, or an error message with `is_error` set.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    fn success<T: Serialize>(result: &T) -> Self {
        let text = serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string());
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message.into())],
            is_error: true,
        }
    }

    /// The single text block's payload.
    pub fn text(&self) -> &str {
        self.content.first().map(|b| b.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    InvalidArguments(#[from] ArgumentValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),
}

/// Routes validated tool calls to the retrieval engine.
pub struct Dispatcher {
    engine: Arc<RetrievalEngine>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self::with_timeout(engine, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(engine: Arc<RetrievalEngine>, call_timeout: Duration) -> Self {
        Self {
            engine,
            call_timeout,
        }
    }

    /// The static tool catalog; identical on every call.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    /// Route one tool call. Infallible by design: all errors come back as
    /// `is_error` responses.
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> ToolResponse {
        let request = match ToolRequest::parse(name, &arguments) {
            None => return refuse(name, DispatchError::UnknownTool(name.to_string())),
            Some(Err(validation)) => {
                return refuse(name, DispatchError::InvalidArguments(validation));
            }
            Some(Ok(request)) => request,
        };

        debug!(tool = name, "dispatching tool call");
        match timeout(self.call_timeout, self.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(engine_error)) => refuse(name, DispatchError::Engine(engine_error)),
            Err(_) => refuse(name, DispatchError::Timeout(self.call_timeout)),
        }
    }

    async fn execute(&self, request: ToolRequest) -> Result<ToolResponse, EngineError> {
        match request {
            ToolRequest::StatuteProvisions(args) => {
                let outcome = self
                    .engine
                    .search_sections(
                        DocumentType::Statute,
                        &args.query,
                        args.section_number.as_deref(),
                        args.max_results,
                    )
                    .await?;
                Ok(ToolResponse::success(&outcome))
            }
            ToolRequest::RulesProvisions(args) => {
                let outcome = self
                    .engine
                    .search_sections(
                        DocumentType::Rules,
                        &args.query,
                        args.section_number.as_deref(),
                        args.max_results,
                    )
                    .await?;
                Ok(ToolResponse::success(&outcome))
            }
            ToolRequest::CaseLaw(args) => {
                let outcome = self
                    .engine
                    .search_case_law(&args.query, args.section.as_deref(), args.max_results)
                    .await?;
                Ok(ToolResponse::success(&outcome))
            }
            ToolRequest::Playbook(args) => {
                let outcome = self
                    .engine
                    .search_playbooks(&args.scenario, args.category.as_deref(), args.max_results)
                    .await?;
                Ok(ToolResponse::success(&outcome))
            }
            ToolRequest::Template(args) => Ok(self.get_template(args).await?),
            ToolRequest::Compliance(args) => Ok(check_compliance_stub(&args)),
            ToolRequest::Semantic(args) => {
                let outcome = self
                    .engine
                    .semantic_search(&args.query, &args.sources, args.max_results)
                    .await?;
                Ok(ToolResponse::success(&outcome))
            }
        }
    }

    async fn get_template(&self, args: TemplateArgs) -> Result<ToolResponse, EngineError> {
        let template = self.engine.current_template(&args.template_type).await?;
        Ok(ToolResponse::success(&json!({
            "found": template.is_some(),
            "case_code": args.case_code,
            "template": template,
        })))
    }
}

fn refuse(tool: &str, error: DispatchError) -> ToolResponse {
    warn!(tool, error = %error, "tool call refused");
    ToolResponse::failure(error.to_string())
}

/// The compliance engine lives outside this service; until it is wired up
/// the tool echoes its inputs with a pending status.
fn check_compliance_stub(args: &ComplianceArgs) -> ToolResponse {
    ToolResponse::success(&json!({
        "status": "pending_implementation",
        "check_type": args.check_type,
        "case_code": args.case_code,
        "organization_id": args.organization_id,
    }))
}
