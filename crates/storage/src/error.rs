use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("You can only execute one statement at a time.")]
    MultipleStatements,

    #[error("statement rejected: database is opened read-only")]
    ReadOnly,

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query task failed: {0}")]
    Join(String),
}
