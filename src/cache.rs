use axum::http::HeaderMap;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::metrics::CACHE_SIZE;

// A stored response: status, content type, the upstream headers we keep and the raw body
#[derive(Clone, Debug, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, Some("application/json"), value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Cache entry with timestamp
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub response: CachedResponse,
    pub cached_at: DateTime<Utc>,
}

/// One named cache partition (a "generation"), mapping request keys to responses.
#[derive(Clone, Default)]
pub struct CachePartition {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl CachePartition {
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.get(key).map(|entry| entry.response.clone())
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    // Last write wins
    pub fn put(&self, key: &str, response: CachedResponse) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                response,
                cached_at: Utc::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// All cache partitions, addressed by name.
#[derive(Default)]
pub struct CacheStorage {
    partitions: DashMap<String, CachePartition>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // Opens a partition, creating it if it does not exist yet
    pub fn open(&self, name: &str) -> CachePartition {
        self.partitions.entry(name.to_string()).or_default().clone()
    }

    #[cfg(test)]
    pub fn has(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    pub fn delete(&self, name: &str) -> bool {
        let removed = self.partitions.remove(name).is_some();
        self.refresh_size();
        removed
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.iter().map(|p| p.key().clone()).collect();
        names.sort();
        names
    }

    /// Looks the key up in every partition, in name order.
    pub fn match_any(&self, key: &str) -> Option<CachedResponse> {
        self.names()
            .iter()
            .filter_map(|name| self.partitions.get(name).map(|p| p.clone()))
            .find_map(|partition| partition.get(key))
    }

    pub fn total_entries(&self) -> usize {
        self.partitions.iter().map(|p| p.len()).sum()
    }

    pub fn refresh_size(&self) {
        CACHE_SIZE.set(self.total_entries() as f64);
    }
}

/// The three versioned partition names that make up one cache generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheNames {
    pub app_name: String,
    pub version: String,
    pub static_shell: String,
    pub prayer_times: String,
    pub runtime: String,
}

impl CacheNames {
    pub fn new(app_name: &str, version: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            static_shell: format!("{app_name}-static-{version}"),
            prayer_times: format!("{app_name}-prayer-times-{version}"),
            runtime: format!("{app_name}-{version}"),
        }
    }

    // Same app, next generation
    pub fn with_version(&self, version: &str) -> Self {
        Self::new(&self.app_name, version)
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_shell, &self.prayer_times, &self.runtime]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}
