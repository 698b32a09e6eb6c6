use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, interval};

use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, today};
use crate::metrics::SYNC_RUNS;
use crate::models::{SyncOutcome, WorkerEvent, prayer_times_key};
use crate::network::{Connectivity, FetchRequest};

pub const PRAYER_TIMES_SYNC_TAG: &str = "prayer-times-sync";

impl Gateway {
    /// Background sync entry point. Failures are logged and reported, never retried here.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag != PRAYER_TIMES_SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown sync tag");
            SYNC_RUNS.with_label_values(&["ignored"]).inc();
            return SyncOutcome::Ignored { tag: tag.to_string() };
        }

        match self.update_prayer_times().await {
            Ok(date) => {
                SYNC_RUNS.with_label_values(&["updated"]).inc();
                tracing::info!(%date, "prayer times synced");
                SyncOutcome::Updated { date }
            }
            Err(e) => {
                SYNC_RUNS.with_label_values(&["failed"]).inc();
                tracing::warn!(error = %e, "failed to update prayer times");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    // Re-fetch today's entry and overwrite the cached copy
    async fn update_prayer_times(&self) -> Result<String> {
        let date = today();
        let key = prayer_times_key(&date);

        let res = self.fetcher.fetch(&FetchRequest::get(&key)).await?;
        if !res.is_success() {
            return Err(GatewayError::UpstreamStatus {
                status: res.status,
                path: key,
            });
        }

        self.storage.open(&self.names().prayer_times).put(&key, res);
        self.storage.refresh_size();
        Ok(date)
    }
}

// Probes the upstream; when it comes back after being unreachable, delivers
// the prayer-times sync tag to the event worker.
pub async fn connectivity_monitor(
    gateway: Arc<Gateway>,
    connectivity: Arc<Connectivity>,
    events: mpsc::Sender<WorkerEvent>,
    probe_interval: Duration,
) {
    let mut interval = interval(probe_interval);

    tracing::info!(interval = ?probe_interval, "connectivity monitor started");

    loop {
        interval.tick().await;

        let online = gateway.fetcher.fetch(&FetchRequest::get("/")).await.is_ok();
        let was_online = connectivity.set_online(online);

        if was_online == online {
            continue;
        }
        if !online {
            tracing::warn!("upstream unreachable, serving from cache");
            continue;
        }

        tracing::info!("connectivity restored, requesting prayer-times sync");
        let (reply, _) = oneshot::channel();
        let event = WorkerEvent::Sync {
            tag: PRAYER_TIMES_SYNC_TAG.to_string(),
            reply,
        };
        if events.send(event).await.is_err() {
            tracing::error!("event worker stopped, connectivity monitor exiting");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheNames, CachedResponse};
    use crate::network::testing::ScriptedFetcher;

    fn todays_payload(fajr: &str) -> CachedResponse {
        CachedResponse::json(
            200,
            &serde_json::json!({ "date": today(), "times": { "fajr": fajr } }),
        )
    }

    fn gateway(fetcher: Arc<ScriptedFetcher>) -> Gateway {
        Gateway::new(CacheNames::new("athan-wake", "v1"), fetcher, vec![])
    }

    #[tokio::test]
    async fn sync_overwrites_todays_entry() {
        let key = prayer_times_key(&today());
        let fetcher = Arc::new(ScriptedFetcher::new().route(&key, todays_payload("05:01")));
        let gw = gateway(fetcher);
        let partition = gw.storage().open("athan-wake-prayer-times-v1");
        partition.put(&key, todays_payload("05:30"));

        let outcome = gw.handle_sync(PRAYER_TIMES_SYNC_TAG).await;
        assert_eq!(outcome, SyncOutcome::Updated { date: today() });
        assert_eq!(partition.get(&key).unwrap(), todays_payload("05:01"));
    }

    #[tokio::test]
    async fn sync_failure_keeps_cached_entry() {
        let key = prayer_times_key(&today());
        let gw = gateway(Arc::new(ScriptedFetcher::offline()));
        let partition = gw.storage().open("athan-wake-prayer-times-v1");
        partition.put(&key, todays_payload("05:30"));

        let outcome = gw.handle_sync(PRAYER_TIMES_SYNC_TAG).await;
        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert_eq!(partition.get(&key).unwrap(), todays_payload("05:30"));
    }

    #[tokio::test]
    async fn sync_does_not_cache_error_status() {
        let gw = gateway(Arc::new(ScriptedFetcher::new()));
        let outcome = gw.handle_sync(PRAYER_TIMES_SYNC_TAG).await;
        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert!(!gw.storage().open("athan-wake-prayer-times-v1").contains(&prayer_times_key(&today())));
    }

    #[tokio::test]
    async fn unknown_tag_is_ignored() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let gw = gateway(fetcher.clone());
        let outcome = gw.handle_sync("quran-sync").await;
        assert_eq!(outcome, SyncOutcome::Ignored { tag: "quran-sync".into() });
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn monitor_requests_sync_when_connectivity_returns() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let gw = Arc::new(gateway(fetcher.clone()));
        let connectivity = Arc::new(Connectivity::new(false));
        let (tx, mut rx) = mpsc::channel(4);

        let monitor = tokio::spawn(connectivity_monitor(
            gw,
            connectivity.clone(),
            tx,
            Duration::from_millis(10),
        ));

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            WorkerEvent::Sync { tag, .. } => assert_eq!(tag, PRAYER_TIMES_SYNC_TAG),
            WorkerEvent::Push { .. } => panic!("expected a sync event"),
        }
        assert!(connectivity.is_online());
        monitor.abort();
    }
}
