//! Bearer-token check for the HTTP adapter.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::ErrorResponse;
use crate::state::AppState;

/// Reject requests without the configured API key. A no-op when no key is set.
///
/// Accepts `Authorization: Bearer <key>` or the bare key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "Rejected request without valid API key");
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Unauthorized")),
        )
            .into_response()
    }
}
