//! Stdio JSON-RPC transport hosting the dispatcher.
//!
//! Newline-delimited JSON-RPC 2.0 on stdin/stdout. Logging must go to
//! stderr; stdout belongs to the protocol.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::dispatcher::Dispatcher;
use crate::protocol::{error_codes, methods, JsonRpcId, JsonRpcRequest, JsonRpcResponse};

/// MCP server: one dispatcher behind a stdio line loop.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Serve until stdin closes. Only transport failures (stdin/stdout I/O)
    /// escape; per-call failures are answered in-band.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        let mut stdout = tokio::io::stdout();

        info!("server ready, waiting for requests");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!(len = line.len(), "received request line");

            let Some(response) = self.handle_line(&line).await else {
                // Notification: no response on the wire.
                continue;
            };

            let text = serde_json::to_string(&response)?;
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    async fn handle_line(&self, input: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "unparseable request");
                return Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        self.handle_request(request).await
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match request.method.as_str() {
            methods::INITIALIZE => Some(self.initialize(request.id)),
            methods::INITIALIZED => {
                debug!("client initialized");
                None
            }
            methods::SHUTDOWN => Some(JsonRpcResponse::success(request.id, json!(null))),
            methods::TOOLS_LIST => Some(JsonRpcResponse::success(
                request.id,
                json!({ "tools": self.dispatcher.list_tools() }),
            )),
            methods::TOOLS_CALL => Some(self.tools_call(request.id, request.params).await),
            other => Some(JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        info!("handling initialize request");
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "lexaid",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    async fn tools_call(
        &self,
        id: Option<JsonRpcId>,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing params for tools/call",
            );
        };
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' parameter in tools/call",
            );
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let response = self.dispatcher.call_tool(name, arguments).await;
        match serde_json::to_value(&response) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("serialize response: {e}"),
            ),
        }
    }
}
