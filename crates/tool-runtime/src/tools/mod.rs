//! Built-in tools backed by the SQLite access layer.

pub mod execute_sql;
pub mod get_schema;
pub mod sample_queries;

pub use execute_sql::ExecuteSqlTool;
pub use get_schema::GetSchemaTool;
pub use sample_queries::{SampleQueries, SampleQueriesTool, SampleQuery};

use sqlmcp_storage::Database;

use crate::registry::{RegistryError, ToolRegistry};

/// The fixed tool surface: `execute_sql`, `get_schema`, `get_sample_queries`.
pub fn sqlite_registry(
    db: Database,
    samples: SampleQueries,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(ExecuteSqlTool::new(db.clone()))?;
    registry.register(GetSchemaTool::new(db))?;
    registry.register(SampleQueriesTool::new(samples))?;
    Ok(registry)
}
