//! Keeps a sidebar's usecase list in step with server-side renames.
//!
//! New usecases start as `"Chat {n}"` and are renamed twice by backend
//! jobs: once by conversation naming and later by document naming after
//! text extraction. Two bounded pollers watch the active selection for
//! those renames while a periodic refresh and an in-process event bus keep
//! the rest of the list current.

pub mod api;
pub mod error;
pub mod events;
pub mod models;
pub mod naming;
pub mod placeholder;
pub mod refresh;
pub mod sidebar;
pub mod snapshot;
pub mod state;
pub mod tracker;
pub mod types;

use std::sync::Arc;

use tokio::task::JoinHandle;

use state::AppState;

/// Long-running tasks started by [`start`].
pub struct BackgroundTasks {
    event_bridge: JoinHandle<()>,
    refresh_poller: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Stop every background task and both stage timers.
    pub fn shutdown(self, state: &AppState) {
        self.event_bridge.abort();
        self.refresh_poller.abort();
        state.shutdown();
        log::info!("Background tasks stopped");
    }
}

/// Spawn the event bridge and the refresh poller.
///
/// Must be called from within a tokio runtime.
pub fn start(state: &Arc<AppState>) -> BackgroundTasks {
    // Subscribe before spawning so early events reach the bridge.
    let rx = state.bus.subscribe();
    let event_bridge = tokio::spawn(events::run_event_bridge(Arc::clone(state), rx));
    let refresh_poller = tokio::spawn(refresh::run_refresh_poller(Arc::clone(state)));
    log::info!("Background tasks started");

    BackgroundTasks {
        event_bridge,
        refresh_poller,
    }
}
