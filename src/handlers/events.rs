use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::models::{ClickRequest, SyncRequest};
use crate::state::AppState;

fn worker_unavailable(e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "event worker unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncRequest>,
) -> Response {
    match state.worker.sync(&payload.tag).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => worker_unavailable(e),
    }
}

// 201 with the notification when shown, 204 when the payload was ignored
pub async fn push_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.worker.push(body).await {
        Ok(Some(notification)) => (StatusCode::CREATED, Json(notification)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => worker_unavailable(e),
    }
}

pub async fn notifications_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.notifications.open_notifications())
}

#[derive(Deserialize)]
pub struct WaitParams {
    #[serde(default = "default_wait_secs")]
    pub timeout: u64,
}

fn default_wait_secs() -> u64 {
    30
}

// Long poll: the next notification shown, or 204 when none arrives in time
pub async fn next_notification_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WaitParams>,
) -> Response {
    let mut feed = state.notifications.subscribe();
    let wait = Duration::from_secs(params.timeout.min(120));

    let next = tokio::time::timeout(wait, async {
        loop {
            match feed.recv().await {
                Ok(notification) => return Some(notification),
                // missed ones are skipped
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notification feed lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    match next {
        Ok(Some(notification)) => Json(notification).into_response(),
        Ok(None) | Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn click_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Response {
    // bare click has no body
    let click = if body.is_empty() {
        ClickRequest::default()
    } else {
        match serde_json::from_slice::<ClickRequest>(&body) {
            Ok(click) => click,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response();
            }
        }
    };

    match state.notifications.click(id, click.action.as_deref()) {
        Some(action) => Json(action).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
