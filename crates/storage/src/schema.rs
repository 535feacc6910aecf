//! Catalog introspection.

use indexmap::IndexMap;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::StorageError;
use crate::value::SqlValue;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NamedObject {
    pub name: String,
}

/// One row of `pragma_table_info`.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub notnull: i64,
    pub dflt_value: SqlValue,
    pub pk: i64,
}

/// Tables and views in catalog-scan order (no sort is applied).
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<NamedObject>,
    pub views: Vec<NamedObject>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<IndexMap<String, Vec<ColumnInfo>>>,
}

impl SchemaDescriptor {
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

/// Result of `describe_schema`, shaped like the other tool payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SchemaResult {
    Ok {
        success: bool,
        schema: SchemaDescriptor,
    },
    Error {
        error: String,
    },
}

impl SchemaResult {
    pub fn schema(&self) -> Option<&SchemaDescriptor> {
        match self {
            SchemaResult::Ok { schema, .. } => Some(schema),
            SchemaResult::Error { .. } => None,
        }
    }
}

impl From<Result<SchemaDescriptor, StorageError>> for SchemaResult {
    fn from(result: Result<SchemaDescriptor, StorageError>) -> Self {
        match result {
            Ok(schema) => SchemaResult::Ok {
                success: true,
                schema,
            },
            Err(e) => SchemaResult::Error {
                error: e.to_string(),
            },
        }
    }
}

fn names_of_type(conn: &Connection, kind: &str) -> Result<Vec<NamedObject>, StorageError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1")?;
    let names = stmt
        .query_map([kind], |row| Ok(NamedObject { name: row.get(0)? }))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, StorageError> {
    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                data_type: row.get(2)?,
                notnull: row.get(3)?,
                dflt_value: SqlValue::from(row.get_ref(4)?),
                pk: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub(crate) fn read_schema(
    conn: &Connection,
    description: String,
    include_columns: bool,
) -> Result<SchemaDescriptor, StorageError> {
    let tables = names_of_type(conn, "table")?;
    let views = names_of_type(conn, "view")?;

    let columns = if include_columns {
        let mut map = IndexMap::with_capacity(tables.len());
        for table in &tables {
            map.insert(table.name.clone(), table_columns(conn, &table.name)?);
        }
        Some(map)
    } else {
        None
    };

    Ok(SchemaDescriptor {
        tables,
        views,
        description,
        columns,
    })
}
