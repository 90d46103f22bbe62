//! Headless sync daemon.
//!
//! Usage: `usecase-sync [config.json]`. Without an argument the config is
//! read from ~/.usecase-sync/config.json. Snapshot changes are logged until
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;

use usecase_sync::api::HttpUsecaseApi;
use usecase_sync::sidebar;
use usecase_sync::snapshot::SnapshotChange;
use usecase_sync::state::{load_config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("Failed to load config")?;
    let api = HttpUsecaseApi::new(&config).context("Failed to build API client")?;
    let active = config.active_usecase_id.clone();
    let state = Arc::new(AppState::new(config, Arc::new(api)));

    let mut changes = state.store.subscribe();
    let tasks = usecase_sync::start(&state);

    match sidebar::refresh(&state).await {
        Ok(list) => log::info!("Loaded {} usecases", list.len()),
        Err(e) => log::warn!("Initial refresh failed, will retry: {}", e),
    }
    if let Some(id) = active {
        sidebar::select(&state, &id).await;
    }

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(SnapshotChange::Renamed { id, name }) => {
                    log::info!("Renamed '{}' -> '{}'", id, name);
                }
                Ok(SnapshotChange::Touched { id }) => log::info!("Moved '{}' to the top", id),
                Ok(SnapshotChange::Replaced) => {
                    log::debug!("Snapshot replaced (version {})", state.store.version());
                }
                Err(RecvError::Lagged(missed)) => log::debug!("Skipped {} snapshot changes", missed),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                log::info!("Shutting down");
                break;
            }
        }
    }

    tasks.shutdown(&state);
    Ok(())
}
