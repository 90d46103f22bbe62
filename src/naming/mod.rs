//! Naming-watch pollers for the active usecase.
//!
//! Two independent pipelines rename a usecase on the server:
//! - Stage 1: conversation naming replaces the `"Chat {n}"` placeholder
//! - Stage 2: document naming runs after text extraction completes
//!
//! Each stage is an explicit state machine with a singleton tick timer.
//! Only the active selection is ever watched.

pub mod stage1;
pub mod stage2;
pub mod timer;

use serde::Serialize;

/// Result of one poller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TickOutcome {
    /// Nothing changed; keep ticking.
    Continue,
    Resolved,
    TimedOut,
    Superseded,
    /// The timer was cleared before or during this tick.
    Cancelled,
}

impl TickOutcome {
    pub fn is_final(self) -> bool {
        self != TickOutcome::Continue
    }
}
