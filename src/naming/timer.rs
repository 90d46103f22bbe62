//! Singleton tick timer handle for one naming stage.
//!
//! Arming always clears the previous timer, so at most one token per slot
//! is live. Clearing is cooperative: the ticker task is detached and exits
//! the next time it finds its token dead, and a fetch already in flight is
//! allowed to finish but its result must be dropped by the token check.

use tokio::task::JoinHandle;

/// Identifies one armed timer. Stale tokens never become live again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    live: Option<u64>,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear any running timer and hand out a fresh live token.
    pub fn arm(&mut self) -> TimerToken {
        self.clear();
        self.generation += 1;
        self.live = Some(self.generation);
        TimerToken(self.generation)
    }

    /// Keep the ticker task for `token`. Dropped if the token already died.
    pub fn attach(&mut self, token: TimerToken, handle: JoinHandle<()>) {
        if self.is_live(token) {
            self.handle = Some(handle);
        }
    }

    pub fn is_live(&self, token: TimerToken) -> bool {
        self.live == Some(token.0)
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    /// Stop future ticks. Returns true if a timer was running.
    pub fn clear(&mut self) -> bool {
        self.handle = None;
        self.live.take().is_some()
    }

    /// Stop future ticks and abort the ticker task, in-flight fetch included.
    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.live = None;
    }
}
