//! Error types for the MCP crate.

use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur while serving MCP.
///
/// Every variant except `Transport` is reported back to the caller as a
/// JSON-RPC error object; `Transport` ends the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// The message was not valid JSON.
    #[error("Parse error: {0}")]
    JsonParse(serde_json::Error),

    /// A response could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Valid JSON that is not a JSON-RPC request object.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Unknown method: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// A tool could not produce any result.
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}

impl McpError {
    pub fn code(&self) -> i64 {
        match self {
            McpError::JsonParse(_) | McpError::InvalidRequest(_) => error_codes::PARSE_ERROR,
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<sqlmcp_tool_runtime::RegistryError> for McpError {
    fn from(err: sqlmcp_tool_runtime::RegistryError) -> Self {
        use sqlmcp_tool_runtime::RegistryError;
        match err {
            RegistryError::UnknownTool(name) => McpError::ToolNotFound(name),
            other => McpError::ToolExecution(other.to_string()),
        }
    }
}
