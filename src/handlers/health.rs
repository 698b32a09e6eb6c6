use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::gateway::LifecycleState;
use crate::state::AppState;

// Only an active generation is healthy; a redundant one never finished installing
fn status_for(lifecycle: LifecycleState) -> (StatusCode, &'static str) {
    match lifecycle {
        LifecycleState::Active => (StatusCode::OK, "healthy"),
        LifecycleState::Installing | LifecycleState::Waiting => (StatusCode::OK, "starting"),
        LifecycleState::Redundant => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    }
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let gateway = &state.gateway;
    let lifecycle = gateway.state();
    let (code, status) = status_for(lifecycle);
    let names = gateway.names();

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "lifecycle": lifecycle,
            "online": state.connectivity.is_online(),
            "version": names.version,
            "generation": names.all(),
            "caches": gateway.storage().names(),
            "cacheEntries": gateway.storage().total_entries(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
