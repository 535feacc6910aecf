//! MCP (Model Context Protocol) implementation for sqlmcp.
//!
//! This crate implements the MCP protocol over JSON-RPC 2.0, exposing the
//! tools of a `ToolRegistry` to MCP clients.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP-specific protocol types
//! - **transport**: Pluggable transport layer (stdio, channels)
//! - **server**: Method dispatch over a `ToolRegistry`
//! - **error**: Error types and their JSON-RPC codes
//!
//! # Usage
//!
//! ```no_run
//! use sqlmcp_mcp::server::McpServer;
//! use sqlmcp_mcp::transport::StdioTransport;
//! use sqlmcp_tool_runtime::ToolRegistry;
//!
//! # async fn example() {
//! let registry = ToolRegistry::new();
//! let server = McpServer::new(registry);
//! let mut transport = StdioTransport::stdio();
//! server.run(&mut transport).await.unwrap();
//! # }
//! ```

pub mod types;
pub mod transport;
pub mod server;
pub mod error;

pub use types::*;
pub use transport::{ChannelTransport, LineTransport, McpTransport, StdioTransport};
pub use server::{parse_message, McpServer, Session, SessionState};
pub use error::McpError;
