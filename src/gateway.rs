//! The offline caching gateway: cache storage, the current generation's
//! partition names and the network it falls back to.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::cache::{CacheNames, CacheStorage};
use crate::models::PrayerSchedule;
use crate::network::Fetcher;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    Redundant,
}

pub struct Gateway {
    pub(crate) storage: Arc<CacheStorage>,
    // swapped on activation of a new generation
    pub(crate) names: watch::Sender<CacheNames>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) static_files: Vec<String>,
    pub(crate) schedule: PrayerSchedule,
    pub(crate) state: watch::Sender<LifecycleState>,
    // one install at a time
    pub(crate) install_lock: Mutex<()>,
}

impl Gateway {
    pub fn new(names: CacheNames, fetcher: Arc<dyn Fetcher>, static_files: Vec<String>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Installing);
        let (names, _) = watch::channel(names);
        Self {
            storage: Arc::new(CacheStorage::new()),
            names,
            fetcher,
            static_files,
            schedule: PrayerSchedule::default(),
            state,
            install_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Partition names of the generation currently serving requests.
    pub fn names(&self) -> CacheNames {
        self.names.borrow().clone()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub(crate) fn set_state(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = ?previous, to = ?next, "lifecycle transition");
        }
    }
}

// ISO date for "today" (UTC), the key the page asks for
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
