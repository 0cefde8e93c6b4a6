//! MCP surface for imsg
//!
//! Line-delimited JSON-RPC 2.0 over stdio. Each tool maps onto one search
//! or contact operation.

pub mod protocol;
pub mod tools;

pub use protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer, ToolCallResult,
    ToolDefinition,
};
pub use tools::{get_tool_definitions, TOOL_DEFINITIONS};
