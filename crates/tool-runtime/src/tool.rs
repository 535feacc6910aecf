use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Describes a tool's interface for MCP clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "execute_sql", "get_schema")
    pub name: String,
    /// Human-readable description for the LLM
    pub description: String,
    /// JSON Schema describing the expected input
    pub input_schema: Value,
}

/// The primary extension point: all tools implement this trait.
///
/// `execute` returns the structured payload the client will see. Failures of
/// the underlying operation belong inside that payload (an `error` field);
/// `Err` is reserved for the tool being unable to produce any payload at all.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to encode tool output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.description)
    }
}

/// Build the `{"error": ...}` payload used for argument problems.
pub(crate) fn error_payload(message: impl Into<String>) -> Value {
    serde_json::json!({ "error": message.into() })
}
