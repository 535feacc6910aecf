//! `execute_sql`: run one caller-supplied statement.
//!
//! The statement is not filtered or sandboxed. Writes are only blocked when the
//! database handle is in read-only mode.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use sqlmcp_storage::Database;

use crate::tool::{error_payload, Tool, ToolDefinition, ToolError};

pub struct ExecuteSqlTool {
    db: Database,
}

impl ExecuteSqlTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ExecuteSqlTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "execute_sql".to_string(),
            description: "Execute a SQL query against the database".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL query to execute"
                    },
                    "params": {
                        "type": "array",
                        "description": "Query parameters (optional)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let Some(query) = arguments.get("query").and_then(Value::as_str) else {
            return Ok(error_payload("missing required argument: query"));
        };

        let params: &[Value] = match arguments.get("params") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items,
            Some(_) => return Ok(error_payload("params must be an array")),
        };

        debug!(query = %query, params = params.len(), "execute_sql");
        let result = self.db.execute(query, params).await;
        Ok(serde_json::to_value(result)?)
    }
}
