use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlMcpError {
    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),
}
