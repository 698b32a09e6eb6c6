use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

pub const PRAYER_TIMES_PREFIX: &str = "/api/prayer-times/";
pub const DEFAULT_ICON: &str = "/placeholder-qto3w.png";

// Prayer-times API resource for one date
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PrayerTimes {
    pub date: String,
    pub times: PrayerSchedule,
}

// HH:MM per prayer
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PrayerSchedule {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl Default for PrayerSchedule {
    fn default() -> Self {
        Self {
            fajr: "05:30".into(),
            sunrise: "07:00".into(),
            dhuhr: "12:15".into(),
            asr: "15:45".into(),
            maghrib: "18:30".into(),
            isha: "20:00".into(),
        }
    }
}

pub fn prayer_times_key(date: &str) -> String {
    format!("{}{}", PRAYER_TIMES_PREFIX, date)
}

// Body returned when prayer times are neither cached nor reachable
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OfflineError {
    pub error: String,
    pub message: String,
}

impl OfflineError {
    pub fn prayer_times() -> Self {
        Self {
            error: "Offline".into(),
            message: "Prayer times unavailable offline".into(),
        }
    }
}

// Incoming push message body
#[derive(Deserialize, Clone, Debug)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

// What gets presented to the user
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: Option<serde_json::Value>,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub silent: bool,
}

#[derive(Deserialize, Default, Debug)]
pub struct ClickRequest {
    #[serde(default)]
    pub action: Option<String>,
}

// What the page side should do after a notification click
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    OpenWindow { url: String },
    None,
}

// Body of /_gateway/install: the cache version to install over the live storage
#[derive(Deserialize, Debug)]
pub struct InstallRequest {
    pub version: String,
}

#[derive(Deserialize, Debug)]
pub struct SyncRequest {
    pub tag: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Updated { date: String },
    Failed { reason: String },
    Ignored { tag: String },
}

// Platform events for the event worker - each carries a one-time reply channel
pub enum WorkerEvent {
    Sync {
        tag: String,
        reply: oneshot::Sender<SyncOutcome>,
    },
    Push {
        body: Bytes,
        reply: oneshot::Sender<Option<Notification>>,
    },
}
