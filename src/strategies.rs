//! Cache-first strategies behind the router.
//!
//! Every strategy writes to its partition only when the network answered with a
//! success status, so error bodies never end up cached.

use crate::cache::{CachePartition, CachedResponse};
use crate::gateway::Gateway;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, NETWORK_FAILURES};
use crate::models::OfflineError;
use crate::network::FetchRequest;

impl Gateway {
    /// `/api/prayer-times/{date}`: cache, then network, then an explicit offline
    /// error so the page can tell "no data" apart from cached data.
    pub(crate) async fn prayer_times_strategy(&self, request: &FetchRequest) -> CachedResponse {
        let partition = self.storage.open(&self.names().prayer_times);

        match self.cache_first(&partition, request, "prayer_times").await {
            Some(res) => res,
            None => {
                let offline = serde_json::to_value(OfflineError::prayer_times())
                    .unwrap_or_default();
                CachedResponse::json(503, &offline)
            }
        }
    }

    // Athan audio is cached lazily, on first request
    pub(crate) async fn audio_strategy(&self, request: &FetchRequest) -> Option<CachedResponse> {
        let partition = self.storage.open(&self.names().runtime);
        self.cache_first(&partition, request, "audio").await
    }

    pub(crate) async fn generic_strategy(&self, request: &FetchRequest) -> Option<CachedResponse> {
        if let Some(res) = self.storage.match_any(&request.path) {
            CACHE_HITS.with_label_values(&["generic"]).inc();
            tracing::debug!(path = %request.path, "cache hit");
            return Some(res);
        }
        CACHE_MISSES.with_label_values(&["generic"]).inc();

        match self.fetcher.fetch(request).await {
            Ok(res) => Some(res),
            Err(e) => {
                NETWORK_FAILURES.inc();
                tracing::warn!(path = %request.path, error = %e, "network fetch failed");
                if request.is_navigation() {
                    // app shell
                    self.storage.match_any("/")
                } else {
                    None
                }
            }
        }
    }

    // Shared by prayer times and audio: hit, or fetch and store on success
    async fn cache_first(
        &self,
        partition: &CachePartition,
        request: &FetchRequest,
        route: &str,
    ) -> Option<CachedResponse> {
        if let Some(entry) = partition.entry(&request.path) {
            CACHE_HITS.with_label_values(&[route]).inc();
            tracing::debug!(path = %request.path, route, cached_at = %entry.cached_at, "cache hit");
            return Some(entry.response);
        }
        CACHE_MISSES.with_label_values(&[route]).inc();
        tracing::debug!(path = %request.path, route, "cache miss, fetching");

        match self.fetcher.fetch(request).await {
            Ok(res) => {
                if res.is_success() {
                    partition.put(&request.path, res.clone());
                    self.storage.refresh_size();
                }
                Some(res)
            }
            Err(e) => {
                NETWORK_FAILURES.inc();
                tracing::warn!(path = %request.path, route, error = %e, "network fetch failed");
                None
            }
        }
    }
}
