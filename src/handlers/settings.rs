use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::state::AppState;

pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.settings.get())
}

pub async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<serde_json::Value>,
) -> Response {
    match state.settings.update(&patch) {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
