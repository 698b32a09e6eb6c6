mod cache;
mod config;
mod error;
mod gateway;
mod handlers;
mod lifecycle;
mod metrics;
mod models;
mod network;
mod push;
mod routing;
mod settings;
mod state;
mod strategies;
mod sync;
mod worker;

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheNames;
use crate::config::Args;
use crate::gateway::Gateway;
use crate::models::WorkerEvent;
use crate::network::{Connectivity, UpstreamClient};
use crate::push::NotificationCenter;
use crate::settings::SettingsStore;
use crate::state::AppState;
use crate::worker::{WorkerHandle, event_worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("athan_gateway=info")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();

    let upstream = UpstreamClient::new(&args.upstream, Duration::from_secs(args.fetch_timeout))?;
    let names = CacheNames::new(&args.app_name, &args.cache_version);
    let gateway = Arc::new(Gateway::new(
        names.clone(),
        Arc::new(upstream),
        args.static_file_list(),
    ));

    // A failed install keeps serving whatever is cached plus the network
    let online = match gateway.install_and_activate().await {
        Ok(purged) => {
            tracing::info!(purged = purged.len(), "cache generation {} active", args.cache_version);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "starting without a fresh cache generation");
            false
        }
    };

    let connectivity = Arc::new(Connectivity::new(online));
    let notifications = Arc::new(NotificationCenter::new("/"));
    let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>(100);

    // spawn the event worker
    tokio::spawn(event_worker(event_rx, gateway.clone(), notifications.clone()));

    tokio::spawn(sync::connectivity_monitor(
        gateway.clone(),
        connectivity.clone(),
        event_tx.clone(),
        Duration::from_secs(args.probe_interval),
    ));

    let settings = SettingsStore::new();
    let mut settings_rx = settings.subscribe();
    tokio::spawn(async move {
        while settings_rx.changed().await.is_ok() {
            let current = settings_rx.borrow_and_update().clone();
            tracing::info!(
                location = %current.location,
                method = %current.calculation_method,
                notifications = current.notifications,
                "settings changed"
            );
        }
    });

    let state = Arc::new(AppState {
        gateway,
        connectivity,
        notifications,
        settings,
        worker: WorkerHandle::new(event_tx),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Upstream origin: {}", args.upstream);
    tracing::info!(
        static_cache = %names.static_shell,
        prayer_times_cache = %names.prayer_times,
        runtime_cache = %names.runtime,
        "cache partitions"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
