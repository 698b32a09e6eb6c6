//! Typed settings store.
//!
//! Settings live as one JSON blob under [`SETTINGS_KEY`] in a key-value store.
//! Readers that care about changes subscribe instead of re-reading the blob.

use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{GatewayError, Result};

pub const SETTINGS_KEY: &str = "athan-wake-settings";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    pub location: String,
    pub calculation_method: String,
    pub athan_voice: String,
    pub quran_font: String,
    pub quran_font_size: u32,
    pub verse_recitation_verification: bool,
    pub dark_mode: bool,
    pub notifications: bool,
    pub vibration: bool,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: "New York, NY".into(),
            calculation_method: "isna".into(),
            athan_voice: "mishary".into(),
            quran_font: "uthmanic".into(),
            quran_font_size: 18,
            verse_recitation_verification: true,
            dark_mode: false,
            notifications: true,
            vibration: true,
            language: "english".into(),
        }
    }
}

pub struct SettingsStore {
    storage: DashMap<String, String>,
    changes: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Settings::default());
        Self {
            storage: DashMap::new(),
            changes,
        }
    }

    // Whatever is stored; defaults when nothing (or garbage) is
    pub fn get(&self) -> Settings {
        self.storage
            .get(SETTINGS_KEY)
            .and_then(|blob| serde_json::from_str(blob.value()).ok())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.changes.subscribe()
    }

    /// Merges a partial JSON object into the current settings. Anything but
    /// an object, and unknown or mistyped fields, are rejected and nothing is
    /// written.
    pub fn update(&self, patch: &Value) -> Result<Settings> {
        let Some(fields) = patch.as_object() else {
            return Err(GatewayError::InvalidSettings(format!(
                "expected an object, got {}",
                json_kind(patch)
            )));
        };

        // The shard stays write-locked from read to notify, so concurrent
        // patches apply one after the other.
        let slot = self.storage.entry(SETTINGS_KEY.to_string());
        let current: Settings = match &slot {
            Entry::Occupied(stored) => serde_json::from_str(stored.get()).unwrap_or_default(),
            Entry::Vacant(_) => Settings::default(),
        };

        let mut merged = serde_json::to_value(current)?;
        if let Some(target) = merged.as_object_mut() {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        let next: Settings = serde_json::from_value(merged)?;

        let _stored = slot.insert(serde_json::to_string(&next)?);
        self.changes.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        Ok(next)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
