use thiserror::Error;

// Errors raised inside the gateway. None of these reach a page directly,
// strategies turn them into fallback responses.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // Transport failure that did not come from reqwest (invalid method, probe failures)
    #[error("Network unavailable: {0}")]
    Offline(String),

    #[error("Upstream returned {status} for {path}")]
    UpstreamStatus { status: u16, path: String },

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event worker is not running")]
    WorkerClosed,
}

pub type Result<T> = std::result::Result<T, GatewayError>;
