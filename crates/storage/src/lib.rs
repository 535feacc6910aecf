//! SQLite access layer for sqlmcp.
//!
//! Every operation opens its own connection, runs on the blocking pool, and
//! closes the connection when it finishes. Nothing is shared between calls,
//! so a [`Database`] can be cloned freely across tasks and HTTP handlers.
//!
//! The public operations are total: failures come back as an embedded
//! `{"error": "..."}` value instead of an `Err`.

pub mod error;
pub mod query;
pub mod schema;
pub mod value;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use sqlmcp_core::config::DatabaseConfig;

pub use error::StorageError;
pub use query::QueryResult;
pub use schema::{ColumnInfo, NamedObject, SchemaDescriptor, SchemaResult};
pub use value::{Row, SqlValue};

/// Whether statements may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

/// Handle to an on-disk SQLite database. Holds no connection.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    mode: AccessMode,
    timeout: Option<Duration>,
    description: String,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::from_config(&DatabaseConfig::for_path(path))
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            mode: if config.read_only {
                AccessMode::ReadOnly
            } else {
                AccessMode::ReadWrite
            },
            timeout: config.query_timeout(),
            description: config.description.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Open a fresh connection. The file is never created.
    fn open(&self) -> Result<Connection, StorageError> {
        let access = match self.mode {
            AccessMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            AccessMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        };
        let flags = access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(StorageError::Open)
    }

    /// Run `work` against a fresh connection on the blocking pool, bounded by
    /// the configured timeout. On timeout the statement is interrupted and the
    /// connection is dropped by the worker once SQLite gives control back.
    async fn with_connection<T, F>(&self, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = self.open()?;
        let interrupt = conn.get_interrupt_handle();
        let task = tokio::task::spawn_blocking(move || work(&conn));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    interrupt.interrupt();
                    warn!(timeout = ?limit, "query exceeded timeout, interrupted");
                    return Err(StorageError::Timeout(limit));
                }
            },
            None => task.await,
        };

        joined.map_err(|e| StorageError::Join(e.to_string()))?
    }

    /// Execute one arbitrary statement with optional positional parameters.
    pub async fn execute(&self, query: &str, params: &[serde_json::Value]) -> QueryResult {
        debug!(query = %query, params = params.len(), "execute");
        let query = query.to_string();
        let params = params.to_vec();
        let mode = self.mode;
        let result = self
            .with_connection(move |conn| query::run_statement(conn, &query, &params, mode))
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "query failed");
        }
        result.into()
    }

    /// List tables and views, optionally with per-table column metadata.
    pub async fn describe_schema(&self, include_columns: bool) -> SchemaResult {
        let description = self.description.clone();
        let result = self
            .with_connection(move |conn| schema::read_schema(conn, description, include_columns))
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "schema introspection failed");
        }
        result.into()
    }
}
