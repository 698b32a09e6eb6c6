use std::sync::Arc;
use crate::gateway::Gateway;
use crate::network::Connectivity;
use crate::push::NotificationCenter;
use crate::settings::SettingsStore;
use crate::worker::WorkerHandle;
// app's shared state

pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub connectivity: Arc<Connectivity>,
    pub notifications: Arc<NotificationCenter>,
    pub settings: SettingsStore,
    pub worker: WorkerHandle, // sync + push go through the event worker
}
