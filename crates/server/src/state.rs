use sqlmcp_core::Config;
use sqlmcp_mcp::McpServer;
use sqlmcp_storage::Database;

/// Shared, read-only state for the HTTP adapter.
pub struct AppState {
    pub mcp: McpServer,
    pub database: Database,
    pub config: Config,
}

impl AppState {
    pub fn api_key(&self) -> Option<&str> {
        self.config.server.api_key.as_deref()
    }

    pub fn protocol_version(&self) -> &str {
        &self.mcp.identity().protocol_version
    }
}
