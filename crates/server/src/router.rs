//! HTTP router construction.
//!
//! Assembles all Axum routes and middleware into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;
use crate::{api, auth};

/// Build the complete application router with all routes and middleware.
///
/// `/health` stays open; everything else sits behind the API key check.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(api::index).post(api::jsonrpc))
        .route("/mcp", post(api::jsonrpc))
        .route("/mcp/server-info", get(api::server_info))
        .route("/.well-known/mcp/config", get(api::mcp_config))
        .route("/mcp/tools", get(api::list_tools))
        .route("/mcp/tools/call", post(api::call_tool))
        .route("/mcp/ping", get(api::ping))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(api::health))
        .merge(protected)
        .layer(cors_layer(&state.config.server.cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}
