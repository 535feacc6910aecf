//! Arbitrary statement execution.

use rusqlite::{params_from_iter, Batch, Connection};
use serde::Serialize;

use crate::error::StorageError;
use crate::value::{bind_value, Row, SqlValue};
use crate::AccessMode;

/// Outcome of a single `execute` call.
///
/// Serializes to exactly one of the three wire shapes; `success` and `error`
/// never appear together.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows {
        success: bool,
        data: Vec<Row>,
        row_count: usize,
    },
    Affected {
        success: bool,
        affected_rows: usize,
    },
    Error {
        error: String,
    },
}

impl QueryResult {
    pub fn rows(data: Vec<Row>) -> Self {
        let row_count = data.len();
        QueryResult::Rows {
            success: true,
            data,
            row_count,
        }
    }

    pub fn affected(affected_rows: usize) -> Self {
        QueryResult::Affected {
            success: true,
            affected_rows,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        QueryResult::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, QueryResult::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            QueryResult::Error { error } => Some(error),
            _ => None,
        }
    }
}

impl From<Result<QueryResult, StorageError>> for QueryResult {
    fn from(result: Result<QueryResult, StorageError>) -> Self {
        result.unwrap_or_else(|e| QueryResult::error(e.to_string()))
    }
}

/// Run one statement on an open connection.
///
/// Input holding no SQL at all (blank or only comments) is rejected, as is
/// input with a second statement after the first. Statements that produce
/// result columns are materialized as rows; anything else runs as a mutation
/// and reports the engine's change count. The connection is in autocommit
/// mode, so mutations are durable on return.
pub(crate) fn run_statement(
    conn: &Connection,
    query: &str,
    params: &[serde_json::Value],
    mode: AccessMode,
) -> Result<QueryResult, StorageError> {
    if query.trim().is_empty() {
        return Err(StorageError::EmptyQuery);
    }

    let mut batch = Batch::new(conn, query);
    let mut stmt = batch.next()?.ok_or(StorageError::EmptyQuery)?;
    if !matches!(batch.next(), Ok(None)) {
        return Err(StorageError::MultipleStatements);
    }
    if mode == AccessMode::ReadOnly && !stmt.readonly() {
        return Err(StorageError::ReadOnly);
    }

    let bound: Vec<_> = params.iter().map(bind_value).collect();

    if stmt.column_count() == 0 {
        let affected = stmt.execute(params_from_iter(bound.iter()))?;
        tracing::debug!(affected, "statement executed");
        return Ok(QueryResult::affected(affected));
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = stmt.query(params_from_iter(bound.iter()))?;
    let mut data = Vec::new();
    while let Some(row) = rows.next()? {
        let mut mapped = Row::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            mapped.insert(name.clone(), SqlValue::from(row.get_ref(idx)?));
        }
        data.push(mapped);
    }

    tracing::debug!(rows = data.len(), "query materialized");
    Ok(QueryResult::rows(data))
}
