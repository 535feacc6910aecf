use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlMcpError;

/// Protocol revision advertised when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub mcp: McpConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SQLMCP_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SQLMCP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            database: DatabaseConfig::from_env_profiled(p),
            server: ServerConfig::from_env_profiled(p),
            mcp: McpConfig::from_env_profiled(p),
        }
    }

    /// Defaults for everything except the database file; ignores the environment.
    pub fn for_database(path: impl AsRef<Path>) -> Self {
        Self {
            profile: String::new(),
            database: DatabaseConfig::for_path(path),
            server: ServerConfig::default(),
            mcp: McpConfig::default(),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Fail fast when the configured database file is missing.
    pub fn ensure_database_exists(&self) -> Result<(), SqlMcpError> {
        if self.database.exists() {
            Ok(())
        } else {
            Err(SqlMcpError::DatabaseNotFound(self.database.path.clone()))
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  database:  path={}, read_only={}, timeout={:?}",
            self.database.path.display(),
            self.database.read_only,
            self.database.query_timeout(),
        );
        let auth = if self.server.api_key.is_some() {
            "bearer"
        } else {
            "none"
        };
        tracing::info!(
            "  server:    {}:{}, auth={}",
            self.server.host,
            self.server.port,
            auth,
        );
        tracing::info!(
            "  mcp:       name={}, protocol={}",
            self.mcp.server_name,
            self.mcp.protocol_version,
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "database": {
                "path": self.database.path,
                "exists": self.database.exists(),
                "read_only": self.database.read_only,
                "query_timeout_secs": self.database.query_timeout_secs,
            },
            "server": {
                "host": self.server.host,
                "port": self.server.port,
                "auth": self.server.api_key.is_some(),
            },
            "mcp": {
                "server_name": self.mcp.server_name,
                "protocol_version": self.mcp.protocol_version,
            },
        })
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub read_only: bool,
    /// Zero disables the bound.
    pub query_timeout_secs: u64,
    pub description: String,
    pub sample_queries_path: Option<PathBuf>,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            path: PathBuf::from(profiled_env_or(p, "DATABASE_PATH", "data.db")),
            read_only: profiled_env_bool(p, "DATABASE_READ_ONLY", false),
            query_timeout_secs: profiled_env_u64(p, "QUERY_TIMEOUT_SECS", 30),
            description: profiled_env_or(
                p,
                "DATABASE_DESCRIPTION",
                "SQLite database exposed over the Model Context Protocol",
            ),
            sample_queries_path: profiled_env_opt(p, "SAMPLE_QUERIES_PATH").map(PathBuf::from),
        }
    }

    /// Config pointing at `path` with every other setting at its default.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            read_only: false,
            query_timeout_secs: 30,
            description: "SQLite database exposed over the Model Context Protocol".to_string(),
            sample_queries_path: None,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}

// ── HTTP server ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Bearer token required by the HTTP adapter when set.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "127.0.0.1"),
            port: profiled_env_u16(p, "PORT", 8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            api_key: profiled_env_opt(p, "MCP_API_KEY"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: "*".to_string(),
            api_key: None,
        }
    }
}

// ── MCP identity ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub server_name: String,
    pub server_version: String,
    pub protocol_version: String,
}

impl McpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            server_name: profiled_env_or(p, "MCP_SERVER_NAME", "sqlmcp"),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: profiled_env_or(p, "MCP_PROTOCOL_VERSION", DEFAULT_PROTOCOL_VERSION),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_name: "sqlmcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }
}
