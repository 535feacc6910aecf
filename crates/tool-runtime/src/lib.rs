pub mod tool;
pub mod tools;
pub mod registry;

pub use tool::{Tool, ToolDefinition, ToolError};
pub use registry::{RegistryError, ToolRegistry};
pub use tools::sample_queries::SampleQueriesError;
pub use tools::{
    sqlite_registry, ExecuteSqlTool, GetSchemaTool, SampleQueries, SampleQueriesTool,
    SampleQuery,
};
