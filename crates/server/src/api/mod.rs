//! HTTP endpoint handlers.
//!
//! Each sub-module owns a single responsibility area.
//! Shared response types live here in mod.rs.

mod info;
mod rpc;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

// ── Re-exports ───────────────────────────────────────────────────

pub use info::{health, index, mcp_config, ping, server_info};
pub use rpc::{call_tool, jsonrpc, list_tools};
