use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::models::InstallRequest;
use crate::state::AppState;

// Installs a new cache version over the live storage and activates it.
// A failed install leaves the serving generation untouched.
pub async fn install_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InstallRequest>,
) -> Response {
    let version = payload.version.trim();
    if version.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "version must not be empty" })),
        )
            .into_response();
    }

    match state.gateway.upgrade(version).await {
        Ok(purged) => Json(serde_json::json!({
            "version": version,
            "purged": purged,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
