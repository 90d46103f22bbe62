//! Sidebar coordinator: selection, refresh and user-initiated actions.
//!
//! Owns the wiring between the snapshot store and both naming stages.
//! Selection changes tear down every timer before anything new is armed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::SyncError;
use crate::events::SidebarEvent;
use crate::naming::stage1::{self, Stage1Phase};
use crate::naming::stage2::{self, Stage2Phase};
use crate::placeholder::next_placeholder_name;
use crate::state::AppState;
use crate::tracker::UsecaseWatches;
use crate::types::{CreateUsecaseRequest, Usecase};

/// Make `id` the active usecase and start watching it.
pub async fn select(state: &Arc<AppState>, id: &str) {
    let previous = {
        let mut active = state.active.lock();
        if active.as_deref() == Some(id) {
            return;
        }
        active.replace(id.to_string())
    };

    teardown(state, previous.as_deref(), Some(id));
    log::info!("Sidebar: selected '{}'", id);

    stage1::evaluate(state);
    stage2::refresh_extraction(state, id).await;
}

/// Drop the selection and every watch attached to it.
pub fn deselect(state: &Arc<AppState>) {
    let Some(previous) = state.active.lock().take() else {
        return;
    };
    teardown(state, Some(&previous), None);
    log::info!("Sidebar: deselected '{}'", previous);
}

fn teardown(state: &AppState, previous: Option<&str>, next: Option<&str>) {
    state.stage1.lock().reset(next.map(str::to_string));
    state.stage2.lock().reset(next.map(str::to_string));

    if let Some(previous) = previous {
        let mut tracker = state.tracker.lock();
        tracker.clear_stage1(previous);
        tracker.clear_stage2(previous);
    }
}

/// Replace the snapshot with the server list, then re-evaluate both stages.
pub async fn refresh(state: &Arc<AppState>) -> Result<Vec<Usecase>, SyncError> {
    let list = state.store.refresh(state.api.as_ref()).await?;
    reconcile(state);
    Ok(list)
}

/// Re-evaluate both stages against the current snapshot.
pub fn reconcile(state: &Arc<AppState>) {
    stage1::evaluate(state);
    stage2::evaluate(state);
}

/// Announce that the user sent input into `id`.
pub fn touch(state: &AppState, id: &str) {
    state.bus.publish(SidebarEvent::EntityTouched {
        entity_id: id.to_string(),
    });
}

pub(crate) fn apply_touch(state: &AppState, id: &str) {
    if state.store.apply_optimistic_touch(id, Utc::now()) {
        log::debug!("Sidebar: moved '{}' to the top", id);
    } else {
        log::debug!("Sidebar: touch for unknown usecase '{}' ignored", id);
    }
}

/// Pick up a usecase created elsewhere: refresh, then select it.
pub(crate) async fn adopt_created(state: &Arc<AppState>, id: &str) {
    if let Err(e) = refresh(state).await {
        log::warn!("Sidebar: refresh after create of '{}' failed: {}", id, e);
    }
    if state.store.get(id).is_none() {
        log::debug!(
            "Sidebar: created '{}' not in snapshot yet, watches wait for the next refresh",
            id
        );
    }
    select(state, id).await;
}

/// Create a new usecase under its placeholder name.
///
/// `owner_id` falls back to the configured owner. The new usecase is
/// announced on the bus; selection happens when the bridge picks it up.
pub async fn create_chat(
    state: &Arc<AppState>,
    owner_id: Option<&str>,
) -> Result<Usecase, SyncError> {
    let owner_id = owner_id
        .map(str::to_string)
        .or_else(|| state.config.owner_id.clone())
        .ok_or_else(|| SyncError::Config("No ownerId configured".to_string()))?;

    let request = CreateUsecaseRequest {
        owner_id,
        name: next_placeholder_name(&state.store.list()),
    };
    let created = state.api.create_usecase(&request).await?;
    log::info!(
        "Sidebar: created '{}' as '{}'",
        created.id,
        created.display_name
    );

    state.bus.publish(SidebarEvent::EntityCreated {
        entity_id: created.id.clone(),
    });
    Ok(created)
}

/// Persist the model chosen for `id`. Unknown models never reach the server.
pub async fn select_model(
    state: &Arc<AppState>,
    id: &str,
    model_id: &str,
) -> Result<(), SyncError> {
    if !state.models.accepts(model_id) {
        return Err(SyncError::UnknownModel(model_id.to_string()));
    }
    state.api.patch_selected_model(id, model_id).await?;
    log::info!("Sidebar: '{}' now uses model '{}'", id, model_id);
    Ok(())
}

/// Diagnostic view of what is being watched right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchReport {
    pub active_id: Option<String>,
    pub stage1_phase: Stage1Phase,
    pub stage1_attempts: u32,
    pub stage1_timer_running: bool,
    pub stage2_phase: Stage2Phase,
    pub stage2_attempts: u32,
    pub stage2_timer_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watches: Option<UsecaseWatches>,
    pub snapshot_version: u64,
}

pub fn watch_report(state: &AppState) -> WatchReport {
    let active_id = state.active_id();
    let (stage1_phase, stage1_attempts, stage1_timer_running) = {
        let poller = state.stage1.lock();
        (poller.phase(), poller.attempts(), poller.is_timer_running())
    };
    let (stage2_phase, stage2_attempts, stage2_timer_running) = {
        let poller = state.stage2.lock();
        (
            poller.phase().clone(),
            poller.attempts(),
            poller.is_timer_running(),
        )
    };
    let watches = active_id
        .as_deref()
        .and_then(|id| state.tracker.lock().watches(id).cloned());

    WatchReport {
        active_id,
        stage1_phase,
        stage1_attempts,
        stage1_timer_running,
        stage2_phase,
        stage2_attempts,
        stage2_timer_running,
        watches,
        snapshot_version: state.store.version(),
    }
}
