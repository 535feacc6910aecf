//! JSON-RPC over HTTP and the direct tool endpoints.
//!
//! Every JSON-RPC exchange answers HTTP 200, protocol errors included. The
//! body is read as raw bytes so malformed input reaches the dispatcher and
//! gets a proper `-32700` response instead of a framework rejection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use sqlmcp_mcp::{CallToolResult, JsonRpcResponse, ListToolsResult, McpError, Session};

use super::{bad_request, ApiError, ErrorResponse};
use crate::state::AppState;

/// `POST /` and `POST /mcp`. Each request is its own session.
pub async fn jsonrpc(State(state): State<Arc<AppState>>, body: Bytes) -> Json<JsonRpcResponse> {
    let raw = String::from_utf8_lossy(&body);
    tracing::debug!(request = %raw, "JSON-RPC request");

    let response = state.mcp.handle_message(&raw, &mut Session::new()).await;

    tracing::debug!(
        response = %serde_json::to_string(&response).unwrap_or_default(),
        "JSON-RPC response"
    );
    Json(response)
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResult> {
    Json(ListToolsResult {
        tools: state.mcp.tools(),
    })
}

/// `POST /mcp/tools/call` with `{name, arguments}`; answers the bare content envelope.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CallToolResult>, ApiError> {
    let call: Value = serde_json::from_slice(&body)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| bad_request("No JSON data provided"))?;

    let name = call
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("missing tool name"))?;

    let arguments = match call.get("arguments") {
        None | Some(Value::Null) => json!({}),
        Some(args) if args.is_object() => args.clone(),
        Some(_) => return Err(bad_request("arguments must be an object")),
    };

    tracing::debug!(tool = %name, "Direct tool call");
    match state.mcp.call_tool(name, arguments).await {
        Ok(result) => Ok(Json(result)),
        Err(e @ McpError::ToolNotFound(_)) => Err(bad_request(e.to_string())),
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "Direct tool call failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
