mod events;
mod fetch;
mod health;
mod install;
mod metrics;
mod settings;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use events::{
    click_handler, next_notification_handler, notifications_handler, push_handler, sync_handler,
};
pub use fetch::fetch_handler;
pub use health::health_handler;
pub use install::install_handler;
pub use metrics::metrics_handler;
pub use settings::{get_settings_handler, put_settings_handler};

// Control routes live under /_gateway, everything else is intercepted
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/_gateway/health", get(health_handler))
        .route("/_gateway/metrics", get(metrics_handler))
        .route("/_gateway/install", post(install_handler))
        .route("/_gateway/sync", post(sync_handler))
        .route("/_gateway/push", post(push_handler))
        .route("/_gateway/notifications", get(notifications_handler))
        .route("/_gateway/notifications/next", get(next_notification_handler))
        .route("/_gateway/notifications/{id}/click", post(click_handler))
        .route(
            "/_gateway/settings",
            get(get_settings_handler).put(put_settings_handler),
        )
        .fallback(fetch_handler)
        .with_state(state)
}
