//! MCP tool surface: catalog, argument validation, dispatch, stdio transport.

pub mod protocol;
pub mod requests;
pub mod tools;

mod dispatcher;
pub use dispatcher::{ContentBlock, DispatchError, Dispatcher, ToolResponse, DEFAULT_CALL_TIMEOUT};

mod server;
pub use server::McpServer;
