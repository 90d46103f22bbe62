//! Stage 1: wait for conversation naming to replace the placeholder.
//!
//! `Idle → Watching → (Resolved | TimedOut)`. Entered when the active
//! usecase still has a placeholder name and no Stage 1 timer is running.
//! Each tick fetches the full list; the watch resolves once the active
//! usecase's name leaves the placeholder pattern, or times out after the
//! attempt budget with the placeholder left in place.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::timer::{TimerSlot, TimerToken};
use super::TickOutcome;
use crate::placeholder::is_placeholder_name;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage1Phase {
    Idle,
    Watching,
    Resolved,
    TimedOut,
}

#[derive(Debug)]
pub struct Stage1Poller {
    phase: Stage1Phase,
    usecase_id: Option<String>,
    attempts: u32,
    timer: TimerSlot,
}

impl Stage1Poller {
    pub fn new() -> Self {
        Self {
            phase: Stage1Phase::Idle,
            usecase_id: None,
            attempts: 0,
            timer: TimerSlot::new(),
        }
    }

    pub fn phase(&self) -> Stage1Phase {
        self.phase
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

    /// Cancel any timer and start over for a new selection.
    pub(crate) fn reset(&mut self, usecase_id: Option<String>) {
        self.timer.clear();
        self.phase = Stage1Phase::Idle;
        self.attempts = 0;
        self.usecase_id = usecase_id;
    }

    pub(crate) fn abort(&mut self) {
        self.timer.abort();
    }
}

impl Default for Stage1Poller {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-evaluate Stage 1 for the active usecase against the snapshot.
///
/// Starts a watch if the name is a placeholder and the poller is idle.
/// Clears any watch if the name has already been resolved elsewhere
/// (e.g. by Stage 2 or a periodic refresh).
pub fn evaluate(state: &Arc<AppState>) {
    let Some(active) = state.active_id() else {
        return;
    };
    let Some(name) = state.store.display_name(&active) else {
        return;
    };

    let mut poller = state.stage1.lock();
    // Selection is switching; the new selection's reset will follow.
    if poller.usecase_id.as_deref() != Some(active.as_str()) {
        return;
    }

    if !is_placeholder_name(&name) {
        let had_watch = state.tracker.lock().clear_stage1(&active).is_some();
        if poller.timer.clear() || had_watch {
            poller.phase = Stage1Phase::Resolved;
            log::debug!(
                "Stage1 poller: '{}' already named '{}', watch cleared",
                active,
                name
            );
        }
        return;
    }

    if poller.phase != Stage1Phase::Idle || poller.timer.is_running() {
        return;
    }

    state.tracker.lock().start_stage1(&active, &name);
    poller.phase = Stage1Phase::Watching;
    poller.attempts = 0;
    let token = poller.timer.arm();

    let interval = Duration::from_millis(state.config.stage1_interval_ms);
    let ticker_state = Arc::clone(state);
    let usecase_id = active.clone();
    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if tick(&ticker_state, token, &usecase_id).await.is_final() {
                break;
            }
        }
    });
    poller.timer.attach(token, handle);

    log::info!(
        "Stage1 poller: watching '{}' ({}) for conversation naming",
        active,
        name
    );
}

/// One Stage 1 poll. Never fails: fetch errors count as a spent attempt.
pub(crate) async fn tick(state: &Arc<AppState>, token: TimerToken, usecase_id: &str) -> TickOutcome {
    if !state.stage1.lock().timer.is_live(token) {
        return TickOutcome::Cancelled;
    }

    let fetched = state.api.list_usecases().await;

    let mut poller = state.stage1.lock();
    // Cleared while the fetch was in flight: resolution, deselect or switch.
    if !poller.timer.is_live(token) {
        return TickOutcome::Cancelled;
    }
    poller.attempts += 1;
    let attempt = poller.attempts;

    let mut other_renames = Vec::new();
    match &fetched {
        Ok(list) => {
            if let Some(fresh) = list.iter().find(|u| u.id == usecase_id) {
                if !is_placeholder_name(&fresh.display_name) {
                    poller.timer.clear();
                    poller.phase = Stage1Phase::Resolved;
                    state.tracker.lock().clear_stage1(usecase_id);
                    drop(poller);

                    log::info!(
                        "Stage1 poller: '{}' named '{}' after {} attempts",
                        usecase_id,
                        fresh.display_name,
                        attempt
                    );
                    state.store.patch_display_name(usecase_id, &fresh.display_name);
                    crate::sidebar::reconcile(state);
                    return TickOutcome::Resolved;
                }
            }

            // Unrelated renames ride along without their own watch.
            for other in list.iter().filter(|u| u.id != usecase_id) {
                let stale = state
                    .store
                    .display_name(&other.id)
                    .is_some_and(|known| known != other.display_name);
                if stale {
                    other_renames.push((other.id.clone(), other.display_name.clone()));
                }
            }
        }
        Err(e) => {
            log::debug!(
                "Stage1 poller: list fetch failed for '{}' (attempt {}): {}",
                usecase_id,
                attempt,
                e
            );
        }
    }

    let outcome = if attempt >= state.config.stage1_max_attempts {
        poller.timer.clear();
        poller.phase = Stage1Phase::TimedOut;
        state.tracker.lock().clear_stage1(usecase_id);
        log::info!(
            "Stage1 poller: gave up on '{}' after {} attempts",
            usecase_id,
            attempt
        );
        TickOutcome::TimedOut
    } else {
        TickOutcome::Continue
    };
    drop(poller);

    for (id, name) in other_renames {
        state.store.patch_display_name(&id, &name);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{usecase, FakeApi};
    use crate::sidebar;
    use crate::state::test_state;

    fn placeholder_api() -> Arc<FakeApi> {
        Arc::new(FakeApi::with_usecases(vec![
            usecase("e1", "Chat 3", 30),
            usecase("e2", "Chat 4", 20),
            usecase("e3", "Checkout Flow", 10),
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_placeholder_after_three_ticks() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();

        sidebar::select(&state, "e1").await;
        assert_eq!(state.stage1.lock().phase(), Stage1Phase::Watching);
        assert!(state.tracker.lock().stage1("e1").is_some());

        // Call 1 was the refresh; ticks are calls 2, 3, 4.
        api.rename_on_list_call(4, "e1", "Login Flow Coverage");
        tokio::time::sleep(Duration::from_millis(6_500)).await;

        assert_eq!(
            state.store.display_name("e1").as_deref(),
            Some("Login Flow Coverage")
        );
        {
            let poller = state.stage1.lock();
            assert_eq!(poller.phase(), Stage1Phase::Resolved);
            assert_eq!(poller.attempts(), 3);
            assert!(!poller.is_timer_running());
        }
        assert!(state.tracker.lock().stage1("e1").is_none());

        let calls = api.list_calls();
        assert_eq!(calls, 4);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.list_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_never_resolves_early() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();

        sidebar::select(&state, "e2").await;
        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let poller = state.stage1.lock();
        assert_eq!(poller.phase(), Stage1Phase::Watching);
        assert_eq!(poller.attempts(), 5);
        assert!(poller.is_timer_running());
        assert_eq!(
            state.tracker.lock().stage1("e2").unwrap().initial_name,
            "Chat 4"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_keeps_placeholder() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();
        api.set_fail_lists(true);

        sidebar::select(&state, "e1").await;
        tokio::time::sleep(Duration::from_secs(31)).await;

        {
            let poller = state.stage1.lock();
            assert_eq!(poller.phase(), Stage1Phase::TimedOut);
            assert_eq!(poller.attempts(), 15);
            assert!(!poller.is_timer_running());
        }
        assert!(state.tracker.lock().stage1("e1").is_none());
        assert_eq!(state.store.display_name("e1").as_deref(), Some("Chat 3"));
        // 1 refresh + 15 failed ticks
        assert_eq!(api.list_calls(), 16);

        // Re-evaluation after a timeout does not restart polling.
        evaluate(&state);
        assert!(!state.stage1.lock().is_timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_patches_unrelated_renames() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();

        sidebar::select(&state, "e1").await;
        api.rename_now("e3", "Checkout Flow Regression");
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(
            state.store.display_name("e3").as_deref(),
            Some("Checkout Flow Regression")
        );
        assert_eq!(state.store.display_name("e1").as_deref(), Some("Chat 3"));
        assert_eq!(state.stage1.lock().phase(), Stage1Phase::Watching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_guard_clears_without_timer() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();

        sidebar::select(&state, "e1").await;
        assert!(state.stage1.lock().is_timer_running());

        // Resolved by someone else before the next tick.
        state.store.patch_display_name("e1", "Signup Edge Cases");
        evaluate(&state);

        assert_eq!(state.stage1.lock().phase(), Stage1Phase::Resolved);
        assert!(!state.stage1.lock().is_timer_running());
        assert!(state.tracker.lock().stage1("e1").is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_selection_starts_no_watch() {
        let api = placeholder_api();
        let state = test_state(api.clone());
        sidebar::refresh(&state).await.unwrap();

        sidebar::select(&state, "e3").await;

        assert_eq!(state.stage1.lock().phase(), Stage1Phase::Idle);
        assert!(!state.stage1.lock().is_timer_running());
        assert!(state.tracker.lock().is_empty());
    }
}
