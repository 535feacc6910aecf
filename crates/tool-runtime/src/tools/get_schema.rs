//! `get_schema`: list tables and views from the catalog.

use async_trait::async_trait;
use serde_json::Value;

use sqlmcp_storage::Database;

use crate::tool::{Tool, ToolDefinition, ToolError};

pub struct GetSchemaTool {
    db: Database,
}

impl GetSchemaTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetSchemaTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_schema".to_string(),
            description: "Get database schema information".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "include_columns": {
                        "type": "boolean",
                        "description": "Also return column metadata for every table"
                    }
                }
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let include_columns = arguments
            .get("include_columns")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let result = self.db.describe_schema(include_columns).await;
        Ok(serde_json::to_value(result)?)
    }
}
