use futures::future::try_join_all;

use crate::cache::{CacheNames, CachedResponse};
use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, LifecycleState, today};
use crate::models::{PrayerTimes, prayer_times_key};
use crate::network::FetchRequest;

impl Gateway {
    /// Populates the static shell partition of the current generation and
    /// seeds today's prayer times.
    ///
    /// Fail-fast: if any shell file cannot be fetched nothing is written and
    /// this generation becomes redundant.
    pub async fn install(&self) -> Result<()> {
        self.set_state(LifecycleState::Installing);

        if let Err(e) = self.install_generation(&self.names()).await {
            self.set_state(LifecycleState::Redundant);
            return Err(e);
        }

        self.set_state(LifecycleState::Waiting);
        Ok(())
    }

    // Writes nothing unless every shell file came back
    async fn install_generation(&self, names: &CacheNames) -> Result<()> {
        let shell = match self.fetch_shell().await {
            Ok(shell) => shell,
            Err(e) => {
                tracing::error!(version = %names.version, error = %e, "install failed, keeping previous generation");
                return Err(GatewayError::Install(e.to_string()));
            }
        };

        let static_cache = self.storage.open(&names.static_shell);
        for (path, response) in shell {
            static_cache.put(&path, response);
        }

        let date = today();
        let seed = PrayerTimes {
            date: date.clone(),
            times: self.schedule.clone(),
        };
        self.storage
            .open(&names.prayer_times)
            .put(&prayer_times_key(&date), CachedResponse::json(200, &serde_json::to_value(seed)?));

        self.storage.refresh_size();
        tracing::info!(
            files = self.static_files.len(),
            seeded = %date,
            cache = %names.static_shell,
            "installed"
        );
        Ok(())
    }

    // Every file must come back with a success status
    async fn fetch_shell(&self) -> Result<Vec<(String, CachedResponse)>> {
        let fetches = self.static_files.iter().map(|path| async move {
            let res = self.fetcher.fetch(&FetchRequest::get(path)).await?;
            if !res.is_success() {
                return Err(GatewayError::UpstreamStatus {
                    status: res.status,
                    path: path.clone(),
                });
            }
            Ok::<_, GatewayError>((path.clone(), res))
        });
        try_join_all(fetches).await
    }

    /// Makes `names` the serving generation, deletes every partition outside it
    /// and takes over request handling. Returns the names that were purged.
    pub fn activate(&self, names: CacheNames) -> Vec<String> {
        let stale: Vec<String> = self
            .storage
            .names()
            .into_iter()
            .filter(|name| !names.is_current(name))
            .collect();

        let version = names.version.clone();
        self.names.send_replace(names);

        for name in &stale {
            self.storage.delete(name);
            tracing::info!(cache = %name, "deleted stale cache");
        }

        self.set_state(LifecycleState::Active);
        tracing::info!(%version, "claimed clients");
        stale
    }

    // Install, then skip waiting
    pub async fn install_and_activate(&self) -> Result<Vec<String>> {
        let _guard = self.install_lock.lock().await;
        self.install().await?;
        Ok(self.activate(self.names()))
    }

    /// Installs generation `version` next to the serving one and activates it.
    /// On failure the serving generation and its state stay as they were.
    pub async fn upgrade(&self, version: &str) -> Result<Vec<String>> {
        let _guard = self.install_lock.lock().await;
        let next = self.names().with_version(version);

        self.install_generation(&next).await?;
        Ok(self.activate(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerSchedule;
    use crate::network::testing::ScriptedFetcher;
    use std::sync::Arc;

    fn shell_fetcher() -> ScriptedFetcher {
        ScriptedFetcher::new()
            .route("/", CachedResponse::new(200, Some("text/html"), "<html>shell</html>"))
            .route(
                "/manifest.json",
                CachedResponse::new(200, Some("application/manifest+json"), "{}"),
            )
    }

    fn gateway(fetcher: ScriptedFetcher, version: &str) -> Gateway {
        Gateway::new(
            CacheNames::new("athan-wake", version),
            Arc::new(fetcher),
            vec!["/".into(), "/manifest.json".into()],
        )
    }

    #[tokio::test]
    async fn install_populates_shell_and_seeds_today() {
        let gw = gateway(shell_fetcher(), "v1");
        gw.install().await.unwrap();
        assert_eq!(gw.state(), LifecycleState::Waiting);

        let shell = gw.storage().open("athan-wake-static-v1");
        assert_eq!(shell.keys(), vec!["/".to_string(), "/manifest.json".to_string()]);

        let seeded = gw
            .storage()
            .open("athan-wake-prayer-times-v1")
            .get(&prayer_times_key(&today()))
            .unwrap();
        let times: PrayerTimes = serde_json::from_slice(&seeded.body).unwrap();
        assert_eq!(times.date, today());
        assert_eq!(times.times, PrayerSchedule::default());
    }

    #[tokio::test]
    async fn install_fails_fast_on_missing_asset() {
        let fetcher = ScriptedFetcher::new()
            .route("/", CachedResponse::new(200, Some("text/html"), "<html>shell</html>"));
        let gw = gateway(fetcher, "v1");

        let err = gw.install_and_activate().await.unwrap_err();
        assert!(matches!(err, GatewayError::Install(_)));
        assert_eq!(gw.state(), LifecycleState::Redundant);
        assert!(!gw.storage().has("athan-wake-static-v1"));
        assert!(!gw.storage().has("athan-wake-prayer-times-v1"));
    }

    #[tokio::test]
    async fn install_fails_when_offline() {
        let gw = gateway(ScriptedFetcher::offline(), "v1");
        assert!(gw.install().await.is_err());
        assert_eq!(gw.storage().total_entries(), 0);
    }

    #[tokio::test]
    async fn activation_purges_stale_generations() {
        let gw = gateway(shell_fetcher(), "v1");
        for stale in ["athan-wake-static-v0", "athan-wake-v0", "unrelated"] {
            gw.storage()
                .open(stale)
                .put("/", CachedResponse::new(200, None, "old"));
        }

        let purged = gw.install_and_activate().await.unwrap();
        assert_eq!(gw.state(), LifecycleState::Active);
        assert_eq!(purged.len(), 3);

        for name in gw.storage().names() {
            assert!(gw.names().is_current(&name), "{name} survived activation");
        }
        assert!(gw.storage().has("athan-wake-static-v1"));
        assert!(gw.storage().has("athan-wake-prayer-times-v1"));
    }

    #[tokio::test]
    async fn upgrade_replaces_serving_generation() {
        let fetcher = Arc::new(shell_fetcher());
        let gw = Gateway::new(
            CacheNames::new("athan-wake", "v1"),
            fetcher.clone(),
            vec!["/".into(), "/manifest.json".into()],
        );
        gw.install_and_activate().await.unwrap();
        gw.storage()
            .open("athan-wake-v1")
            .put("/audio/athan/mishary.mp3", CachedResponse::new(200, Some("audio/mpeg"), "mp3"));

        fetcher.set_route("/", CachedResponse::new(200, Some("text/html"), "<html>v2</html>"));
        let mut purged = gw.upgrade("v2").await.unwrap();
        purged.sort();
        assert_eq!(
            purged,
            vec![
                "athan-wake-prayer-times-v1".to_string(),
                "athan-wake-static-v1".to_string(),
                "athan-wake-v1".to_string(),
            ]
        );
        assert_eq!(gw.names().version, "v2");
        assert_eq!(gw.state(), LifecycleState::Active);

        fetcher.set_online(false);
        let res = gw.handle_fetch(&FetchRequest::navigate("/")).await.unwrap();
        assert_eq!(res.body, bytes::Bytes::from("<html>v2</html>"));
    }

    #[tokio::test]
    async fn failed_upgrade_keeps_previous_generation_active() {
        let fetcher = Arc::new(shell_fetcher());
        let gw = Gateway::new(
            CacheNames::new("athan-wake", "v1"),
            fetcher.clone(),
            vec!["/".into(), "/manifest.json".into()],
        );
        gw.install_and_activate().await.unwrap();

        fetcher.set_route("/manifest.json", CachedResponse::new(404, Some("text/plain"), "gone"));
        let err = gw.upgrade("v2").await.unwrap_err();
        assert!(matches!(err, GatewayError::Install(_)));

        assert_eq!(gw.state(), LifecycleState::Active);
        assert_eq!(gw.names().version, "v1");
        assert!(!gw.storage().has("athan-wake-static-v2"));
        assert!(!gw.storage().has("athan-wake-prayer-times-v2"));
        assert_eq!(
            gw.storage().open("athan-wake-static-v1").get("/").unwrap().body,
            bytes::Bytes::from("<html>shell</html>")
        );
    }

    #[tokio::test]
    async fn shell_served_offline_after_install() {
        let fetcher = Arc::new(shell_fetcher());
        let gw = Gateway::new(
            CacheNames::new("athan-wake", "v1"),
            fetcher.clone(),
            vec!["/".into(), "/manifest.json".into()],
        );
        gw.install_and_activate().await.unwrap();
        fetcher.set_online(false);

        let res = gw.handle_fetch(&FetchRequest::navigate("/alarms")).await.unwrap();
        assert_eq!(res.body, bytes::Bytes::from("<html>shell</html>"));
    }
}
