//! Background snapshot refresh poller.
//!
//! Catches renames that happen with no watch running and repairs anything
//! a dropped bus event would have changed.

use std::sync::Arc;
use std::time::Duration;

use crate::naming::stage2;
use crate::sidebar;
use crate::state::AppState;

pub async fn run_refresh_poller(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.refresh_interval_secs);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = state.refresh_wake.notified() => {
                log::info!("Refresh poller: woken by manual refresh signal");
            },
        }

        match sidebar::refresh(&state).await {
            Ok(list) => log::debug!("Refresh poller: {} usecases", list.len()),
            Err(e) if e.is_transient() => {
                log::debug!("Refresh poller: refresh failed, will retry: {}", e)
            }
            Err(e) => log::warn!("Refresh poller: refresh failed: {}", e),
        }

        // Extraction may have completed since selection.
        if let Some(active) = state.active_id() {
            stage2::refresh_extraction(&state, &active).await;
        }
    }
}

/// Wake the refresh poller now instead of at its next interval.
pub fn request_refresh(state: &AppState) {
    state.refresh_wake.notify_one();
}
