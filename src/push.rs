use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::metrics::NOTIFICATIONS_SHOWN;
use crate::models::{
    ClientAction, DEFAULT_ICON, Notification, NotificationAction, PushPayload,
};

pub const VIEW_ACTION: &str = "view";
pub const DISMISS_ACTION: &str = "dismiss";

// Oldest notifications are dropped past this many
pub const MAX_OPEN_NOTIFICATIONS: usize = 50;

/// Presents push messages as notifications and routes clicks on them.
///
/// Every shown notification is also broadcast to subscribers; a subscriber
/// that falls behind skips what it missed.
pub struct NotificationCenter {
    // id -> (order shown, notification)
    open: DashMap<Uuid, (u64, Notification)>,
    shown: AtomicU64,
    capacity: usize,
    feed: broadcast::Sender<Notification>,
    root_url: String,
}

impl NotificationCenter {
    pub fn new(root_url: &str) -> Self {
        Self::with_capacity(root_url, MAX_OPEN_NOTIFICATIONS)
    }

    pub fn with_capacity(root_url: &str, capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity.max(1));
        Self {
            open: DashMap::new(),
            shown: AtomicU64::new(0),
            capacity,
            feed,
            root_url: root_url.to_string(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.feed.subscribe()
    }

    /// Shows a notification for a push body. Empty or malformed bodies show nothing.
    pub fn present(&self, body: &[u8]) -> Option<Notification> {
        if body.is_empty() {
            return None;
        }
        let payload: PushPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed push payload");
                return None;
            }
        };

        let notification = build_notification(payload);
        let order = self.shown.fetch_add(1, Ordering::Relaxed);
        self.open.insert(notification.id, (order, notification.clone()));
        self.evict_oldest();

        NOTIFICATIONS_SHOWN.inc();
        tracing::info!(id = %notification.id, title = %notification.title, "notification shown");

        // no subscribers is fine
        let _ = self.feed.send(notification.clone());
        Some(notification)
    }

    fn evict_oldest(&self) {
        while self.open.len() > self.capacity {
            let oldest = self
                .open
                .iter()
                .min_by_key(|entry| entry.value().0)
                .map(|entry| *entry.key());
            let Some(id) = oldest else { break };
            self.open.remove(&id);
            tracing::debug!(%id, "evicted oldest notification");
        }
    }

    // Oldest first
    pub fn open_notifications(&self) -> Vec<Notification> {
        let mut open: Vec<(u64, Notification)> =
            self.open.iter().map(|entry| entry.value().clone()).collect();
        open.sort_by_key(|(order, _)| *order);
        open.into_iter().map(|(_, notification)| notification).collect()
    }

    /// Closes the notification. `view` or a click on the body opens the app root;
    /// `None` is returned when no such notification is open.
    pub fn click(&self, id: Uuid, action: Option<&str>) -> Option<ClientAction> {
        let (_, (_, notification)) = self.open.remove(&id)?;
        tracing::debug!(id = %notification.id, ?action, "notification clicked");

        match action {
            None | Some("") | Some(VIEW_ACTION) => Some(ClientAction::OpenWindow {
                url: self.root_url.clone(),
            }),
            Some(_) => Some(ClientAction::None),
        }
    }
}

fn build_notification(payload: PushPayload) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        title: payload.title,
        body: payload.body,
        icon: DEFAULT_ICON.to_string(),
        badge: DEFAULT_ICON.to_string(),
        vibrate: vec![200, 100, 200],
        data: payload.data,
        actions: vec![
            NotificationAction {
                action: VIEW_ACTION.into(),
                title: "View".into(),
                icon: "/eye-icon.png".into(),
            },
            NotificationAction {
                action: DISMISS_ACTION.into(),
                title: "Dismiss".into(),
                icon: "/abstract-x-icon.png".into(),
            },
        ],
        require_interaction: true,
        silent: false,
    }
}
