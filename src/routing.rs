use axum::http::Method;

use crate::cache::CachedResponse;
use crate::gateway::Gateway;
use crate::metrics::{NETWORK_FAILURES, REQUEST_TOTAL};
use crate::models::PRAYER_TIMES_PREFIX;
use crate::network::FetchRequest;

pub const AUDIO_SEGMENT: &str = "/audio/athan/";

// Which cache strategy answers a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    PrayerTimes,
    Audio,
    Generic,
}

impl Route {
    pub fn classify(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or(path);
        if path.starts_with(PRAYER_TIMES_PREFIX) {
            Route::PrayerTimes
        } else if path.contains(AUDIO_SEGMENT) {
            Route::Audio
        } else {
            Route::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::PrayerTimes => "prayer_times",
            Route::Audio => "audio",
            Route::Generic => "generic",
        }
    }
}

impl Gateway {
    /// Answers an intercepted request. `None` means neither cache nor network
    /// produced anything and there is no fallback for this kind of request.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<CachedResponse> {
        // Only GET responses are cacheable, everything else goes straight out
        if request.method != Method::GET {
            REQUEST_TOTAL.with_label_values(&["passthrough"]).inc();
            return match self.fetcher.fetch(request).await {
                Ok(res) => Some(res),
                Err(e) => {
                    NETWORK_FAILURES.inc();
                    tracing::warn!(path = %request.path, error = %e, "passthrough fetch failed");
                    None
                }
            };
        }

        let route = Route::classify(&request.path);
        REQUEST_TOTAL.with_label_values(&[route.as_str()]).inc();

        match route {
            Route::PrayerTimes => Some(self.prayer_times_strategy(request).await),
            Route::Audio => self.audio_strategy(request).await,
            Route::Generic => self.generic_strategy(request).await,
        }
    }
}
