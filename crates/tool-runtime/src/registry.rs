use crate::tool::{Tool, ToolDefinition, ToolError};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Manages available tools, their schemas, and lookup.
///
/// Tools are listed in registration order. The registry is filled once at
/// startup and then shared read-only, so the tool set is fixed for the life
/// of the process.
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Register a tool. Returns error if name already registered.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let def = tool.definition();
        if self.tools.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        self.tools.insert(def.name, Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by exact, case-sensitive name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool definitions.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Invoke a tool by name.
    ///
    /// An unregistered name is `UnknownTool`, distinct from a tool that ran
    /// and reported a failure in its payload.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, RegistryError> {
        let tool = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, "invoking tool");
        Ok(tool.execute(arguments).await?)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{0}' is already registered")]
    DuplicateName(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Tool(#[from] ToolError),
}
