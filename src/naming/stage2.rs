//! Stage 2: wait for document naming after text extraction completes.
//!
//! `Idle → WaitingForExtraction → Watching → (Resolved | TimedOut | Superseded)`.
//!
//! The baseline name is captured when extraction is first observed
//! completed and travels with the ticker task as an immutable value; the
//! tracker copy is informational only. On divergence the timer is cleared
//! before the snapshot is patched, since the patch triggers re-evaluation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::timer::{TimerSlot, TimerToken};
use super::TickOutcome;
use crate::state::AppState;
use crate::types::ExtractionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Stage2Phase {
    Idle,
    WaitingForExtraction,
    Watching { baseline: String },
    Resolved,
    TimedOut,
    /// Extraction reverted to not-completed while watching.
    Superseded,
}

#[derive(Debug)]
pub struct Stage2Poller {
    phase: Stage2Phase,
    usecase_id: Option<String>,
    attempts: u32,
    timer: TimerSlot,
}

impl Stage2Poller {
    pub fn new() -> Self {
        Self {
            phase: Stage2Phase::Idle,
            usecase_id: None,
            attempts: 0,
            timer: TimerSlot::new(),
        }
    }

    pub fn phase(&self) -> &Stage2Phase {
        &self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn usecase_id(&self) -> Option<&str> {
        self.usecase_id.as_deref()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Cancel any timer; a new selection starts out waiting for extraction.
    pub(crate) fn reset(&mut self, usecase_id: Option<String>) {
        self.timer.clear();
        self.phase = if usecase_id.is_some() {
            Stage2Phase::WaitingForExtraction
        } else {
            Stage2Phase::Idle
        };
        self.attempts = 0;
        self.usecase_id = usecase_id;
    }

    pub(crate) fn abort(&mut self) {
        self.timer.abort();
    }

    fn finish(&mut self, state: &AppState, usecase_id: &str, phase: Stage2Phase) {
        self.timer.clear();
        self.phase = phase;
        state.tracker.lock().clear_stage2(usecase_id);
    }
}

impl Default for Stage2Poller {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch the extraction status of `usecase_id` and feed it to Stage 2.
pub async fn refresh_extraction(state: &Arc<AppState>, usecase_id: &str) {
    let name_at_request = state.store.display_name(usecase_id);
    match state.api.get_extraction_status(usecase_id).await {
        Ok(status) => observe_extraction(state, usecase_id, &status, name_at_request.as_deref()),
        Err(e) => log::debug!(
            "Stage2 poller: extraction status fetch failed for '{}': {}",
            usecase_id,
            e
        ),
    }
}

/// Apply an extraction-status observation for `usecase_id`.
///
/// `name_at_request` is the display name when the status request was
/// issued; it becomes the baseline on the first completed observation.
/// Observations for anything but the current selection are ignored.
pub fn observe_extraction(
    state: &Arc<AppState>,
    usecase_id: &str,
    status: &ExtractionStatus,
    name_at_request: Option<&str>,
) {
    let current = state.store.display_name(usecase_id);

    let mut poller = state.stage2.lock();
    if poller.usecase_id.as_deref() != Some(usecase_id) {
        return;
    }

    if !status.is_completed() {
        if matches!(poller.phase, Stage2Phase::Watching { .. }) {
            poller.finish(state, usecase_id, Stage2Phase::Superseded);
            log::info!(
                "Stage2 poller: extraction for '{}' reverted to '{}', watch dropped",
                usecase_id,
                status.text_extraction
            );
        }
        return;
    }

    if !matches!(
        poller.phase,
        Stage2Phase::WaitingForExtraction | Stage2Phase::Superseded
    ) {
        return;
    }
    // Not in the snapshot yet; the next observation will retry.
    let Some(current) = current else {
        return;
    };
    let baseline = name_at_request.unwrap_or(current.as_str()).to_string();

    if current != baseline {
        // The rename landed while the status request was in flight.
        poller.finish(state, usecase_id, Stage2Phase::Resolved);
        log::info!(
            "Stage2 poller: '{}' already renamed to '{}', nothing to watch",
            usecase_id,
            current
        );
        return;
    }

    state.tracker.lock().start_stage2(usecase_id, &baseline);
    poller.phase = Stage2Phase::Watching {
        baseline: baseline.clone(),
    };
    poller.attempts = 0;
    let token = poller.timer.arm();

    let interval = Duration::from_millis(state.config.stage2_interval_ms);
    let ticker_state = Arc::clone(state);
    let ticker_id = usecase_id.to_string();
    let ticker_baseline = baseline.clone();
    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if tick(&ticker_state, token, &ticker_id, &ticker_baseline)
                .await
                .is_final()
            {
                break;
            }
        }
    });
    poller.timer.attach(token, handle);

    log::info!(
        "Stage2 poller: extraction completed for '{}', watching baseline '{}'",
        usecase_id,
        baseline
    );
}

/// Re-evaluate Stage 2 against the snapshot: a rename that arrived through
/// another writer (refresh, Stage 1) resolves the watch without a tick.
pub fn evaluate(state: &Arc<AppState>) {
    let Some(active) = state.active_id() else {
        return;
    };
    let Some(current) = state.store.display_name(&active) else {
        return;
    };

    let mut poller = state.stage2.lock();
    if poller.usecase_id.as_deref() != Some(active.as_str()) {
        return;
    }
    let diverged = matches!(
        &poller.phase,
        Stage2Phase::Watching { baseline } if *baseline != current
    );
    if diverged {
        poller.finish(state, &active, Stage2Phase::Resolved);
        log::debug!(
            "Stage2 poller: '{}' renamed to '{}' outside the poller, watch cleared",
            active,
            current
        );
    }
}

/// One Stage 2 poll against the captured `baseline`. Never fails.
pub(crate) async fn tick(
    state: &Arc<AppState>,
    token: TimerToken,
    usecase_id: &str,
    baseline: &str,
) -> TickOutcome {
    if !state.stage2.lock().timer.is_live(token) {
        return TickOutcome::Cancelled;
    }

    let (listed, status) = tokio::join!(
        state.api.list_usecases(),
        state.api.get_extraction_status(usecase_id)
    );

    let mut poller = state.stage2.lock();
    if !poller.timer.is_live(token) {
        return TickOutcome::Cancelled;
    }
    poller.attempts += 1;
    let attempt = poller.attempts;

    if let Ok(status) = &status {
        if !status.is_completed() {
            poller.finish(state, usecase_id, Stage2Phase::Superseded);
            log::info!(
                "Stage2 poller: extraction for '{}' reverted to '{}', watch dropped",
                usecase_id,
                status.text_extraction
            );
            return TickOutcome::Superseded;
        }
    }

    match &listed {
        Ok(list) => {
            if let Some(fresh) = list.iter().find(|u| u.id == usecase_id) {
                if fresh.display_name != baseline {
                    poller.finish(state, usecase_id, Stage2Phase::Resolved);
                    drop(poller);

                    log::info!(
                        "Stage2 poller: '{}' renamed '{}' -> '{}' after {} attempts",
                        usecase_id,
                        baseline,
                        fresh.display_name,
                        attempt
                    );
                    state.store.patch_display_name(usecase_id, &fresh.display_name);
                    crate::sidebar::reconcile(state);
                    return TickOutcome::Resolved;
                }
            }
        }
        Err(e) => {
            log::debug!(
                "Stage2 poller: list fetch failed for '{}' (attempt {}): {}",
                usecase_id,
                attempt,
                e
            );
        }
    }

    if attempt >= state.config.stage2_max_attempts {
        poller.finish(state, usecase_id, Stage2Phase::TimedOut);
        log::info!(
            "Stage2 poller: gave up on '{}' after {} attempts",
            usecase_id,
            attempt
        );
        return TickOutcome::TimedOut;
    }

    TickOutcome::Continue
}
