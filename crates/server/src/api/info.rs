//! Health, discovery, and liveness endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use sqlmcp_storage::AccessMode;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub mcp_version: String,
    pub timestamp: String,
}

/// Liveness plus whether the database file is present. Never requires auth.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        database: state.database.exists(),
        mcp_version: state.protocol_version().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Server identity and an index of the available endpoints.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    let identity = state.mcp.identity();
    Json(json!({
        "name": identity.server_name,
        "version": identity.server_version,
        "description": state.config.database.description,
        "endpoints": {
            "jsonrpc": "/mcp",
            "health": "/health",
            "server_info": "/mcp/server-info",
            "mcp_config": "/.well-known/mcp/config",
            "tools": "/mcp/tools",
            "tools_call": "/mcp/tools/call",
            "ping": "/mcp/ping",
        },
        "tools": state.mcp.registry().names().collect::<Vec<_>>(),
    }))
}

pub async fn server_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "serverInfo": state.mcp.server_info(),
        "protocolVersion": state.protocol_version(),
        "capabilities": {"tools": {"listChanged": false}},
        "tools": state.mcp.registry().len(),
        "database": {
            "path": state.database.path().display().to_string(),
            "read_only": state.database.mode() == AccessMode::ReadOnly,
            "exists": state.database.exists(),
        },
        "config": state.config.redacted_summary(),
    }))
}

/// Discovery document for clients that probe `/.well-known/mcp/config`.
pub async fn mcp_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let identity = state.mcp.identity();
    let auth = if state.api_key().is_some() {
        "bearer"
    } else {
        "none"
    };
    Json(json!({
        "version": state.protocol_version(),
        "name": identity.server_name,
        "description": state.config.database.description,
        "capabilities": {
            "tools": true,
            "resources": false,
            "prompts": false,
        },
        "auth": {"type": auth},
        "endpoint": "/mcp",
    }))
}

pub async fn ping() -> Json<Value> {
    Json(json!({"result": "pong"}))
}
