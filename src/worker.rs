use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::models::{Notification, SyncOutcome, WorkerEvent};
use crate::push::NotificationCenter;

// Platform events are handled one at a time, each running to completion
pub async fn event_worker(
    mut rx: mpsc::Receiver<WorkerEvent>,
    gateway: Arc<Gateway>,
    notifications: Arc<NotificationCenter>,
) {
    tracing::info!("event worker started");

    while let Some(event) = rx.recv().await {
        match event {
            WorkerEvent::Sync { tag, reply } => {
                let outcome = gateway.handle_sync(&tag).await;
                // caller may not wait for the result
                let _ = reply.send(outcome);
            }
            WorkerEvent::Push { body, reply } => {
                let shown = notifications.present(&body);
                let _ = reply.send(shown);
            }
        }
    }

    tracing::info!("event worker stopped");
}

// Handle for queueing events and awaiting their replies
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerEvent>,
}

impl WorkerHandle {
    pub fn new(tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }

    pub async fn sync(&self, tag: &str) -> Result<SyncOutcome> {
        let (reply, response_rx) = oneshot::channel();
        self.tx
            .send(WorkerEvent::Sync {
                tag: tag.to_string(),
                reply,
            })
            .await
            .map_err(|_| GatewayError::WorkerClosed)?;
        response_rx.await.map_err(|_| GatewayError::WorkerClosed)
    }

    pub async fn push(&self, body: bytes::Bytes) -> Result<Option<Notification>> {
        let (reply, response_rx) = oneshot::channel();
        self.tx
            .send(WorkerEvent::Push { body, reply })
            .await
            .map_err(|_| GatewayError::WorkerClosed)?;
        response_rx.await.map_err(|_| GatewayError::WorkerClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheNames;
    use crate::network::testing::ScriptedFetcher;
    use crate::sync::PRAYER_TIMES_SYNC_TAG;

    fn spawn_worker() -> (WorkerHandle, Arc<NotificationCenter>) {
        let gateway = Arc::new(Gateway::new(
            CacheNames::new("athan-wake", "v1"),
            Arc::new(ScriptedFetcher::offline()),
            vec![],
        ));
        let notifications = Arc::new(NotificationCenter::new("/"));
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(event_worker(rx, gateway, notifications.clone()));
        (WorkerHandle::new(tx), notifications)
    }

    #[tokio::test]
    async fn push_events_are_presented() {
        let (handle, notifications) = spawn_worker();
        let shown = handle
            .push(bytes::Bytes::from_static(br#"{"title":"Isha","body":"It's time"}"#))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shown.title, "Isha");
        assert_eq!(notifications.open_notifications().len(), 1);

        assert!(handle.push(bytes::Bytes::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_events_report_outcome() {
        let (handle, _) = spawn_worker();
        let outcome = handle.sync(PRAYER_TIMES_SYNC_TAG).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn closed_worker_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = WorkerHandle::new(tx);
        assert!(matches!(
            handle.sync(PRAYER_TIMES_SYNC_TAG).await,
            Err(GatewayError::WorkerClosed)
        ));
    }
}
