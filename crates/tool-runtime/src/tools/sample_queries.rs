//! `get_sample_queries`: canned queries a client can start from.
//!
//! Samples are loaded once at startup from a YAML map:
//!
//! ```yaml
//! basic_stats:
//!   description: Overall totals
//!   query: SELECT COUNT(*) AS total FROM incidents;
//! ```

use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::{Tool, ToolDefinition, ToolError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleQuery {
    pub description: String,
    pub query: String,
}

/// Named sample queries in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SampleQueries(IndexMap<String, SampleQuery>);

#[derive(Debug, thiserror::Error)]
pub enum SampleQueriesError {
    #[error("failed to read sample queries: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse sample queries: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SampleQueries {
    /// Catalog queries that work against any SQLite file.
    pub fn builtin() -> Self {
        let entries = [
            (
                "list_tables",
                "All tables",
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;",
            ),
            (
                "list_views",
                "All views",
                "SELECT name FROM sqlite_master WHERE type = 'view' ORDER BY name;",
            ),
            (
                "list_indexes",
                "Indexes and the tables they belong to",
                "SELECT name, tbl_name FROM sqlite_master WHERE type = 'index' ORDER BY tbl_name, name;",
            ),
            (
                "sqlite_version",
                "Engine version",
                "SELECT sqlite_version() AS version;",
            ),
        ];
        Self(
            entries
                .into_iter()
                .map(|(key, description, query)| {
                    (
                        key.to_string(),
                        SampleQuery {
                            description: description.to_string(),
                            query: query.to_string(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SampleQueriesError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, SampleQueriesError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn get(&self, key: &str) -> Option<&SampleQuery> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct SampleQueriesTool {
    samples: SampleQueries,
}

impl SampleQueriesTool {
    pub fn new(samples: SampleQueries) -> Self {
        Self { samples }
    }
}

#[async_trait]
impl Tool for SampleQueriesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_sample_queries".to_string(),
            description: "Get sample queries for common analysis".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        Ok(serde_json::json!({
            "success": true,
            "sample_queries": self.samples,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_keeps_file_order() {
        let samples = SampleQueries::from_yaml_str(
            "monthly:\n  description: Monthly trend\n  query: SELECT 1;\nbasic:\n  description: Totals\n  query: SELECT 2;\n",
        )
        .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.get("basic").unwrap().query, "SELECT 2;");

        let encoded = serde_json::to_string(&samples).unwrap();
        assert!(encoded.find("monthly").unwrap() < encoded.find("basic").unwrap());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SampleQueries::from_yaml_str("basic: [not, a, sample]").unwrap_err();
        assert!(matches!(err, SampleQueriesError::Yaml(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.yaml");
        std::fs::write(
            &path,
            "top:\n  description: Top rows\n  query: SELECT * FROM t LIMIT 10;\n",
        )
        .unwrap();
        let samples = SampleQueries::load(&path).unwrap();
        assert_eq!(samples.get("top").unwrap().description, "Top rows");
    }

    #[tokio::test]
    async fn tool_wraps_samples() {
        let tool = SampleQueriesTool::new(SampleQueries::builtin());
        let out = tool.execute(json!({})).await.unwrap();
        assert_eq!(out["success"], json!(true));
        assert_eq!(
            out["sample_queries"]["sqlite_version"]["query"],
            json!("SELECT sqlite_version() AS version;")
        );
    }
}
