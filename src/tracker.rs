//! Per-usecase naming-watch records for both naming pipelines.
//!
//! Pure data: callers (the stage pollers) decide when timers run. A usecase
//! with no active watch has no entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Waiting for the conversation naming job to replace a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage1Watch {
    pub initial_name: String,
    pub is_polling: bool,
    pub start_time: DateTime<Utc>,
}

/// Waiting for the document naming job after text extraction completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage2Watch {
    /// Baseline captured when extraction was first observed completed.
    pub initial_name: String,
    pub extraction_completed_observed: bool,
    pub is_polling: bool,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsecaseWatches {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage1: Option<Stage1Watch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage2: Option<Stage2Watch>,
}

impl UsecaseWatches {
    fn is_empty(&self) -> bool {
        self.stage1.is_none() && self.stage2.is_none()
    }
}

#[derive(Debug, Default)]
pub struct StageTracker {
    watches: HashMap<String, UsecaseWatches>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_stage1(&mut self, id: &str, placeholder_name: &str) {
        self.watches.entry(id.to_string()).or_default().stage1 = Some(Stage1Watch {
            initial_name: placeholder_name.to_string(),
            is_polling: true,
            start_time: Utc::now(),
        });
    }

    pub fn clear_stage1(&mut self, id: &str) -> Option<Stage1Watch> {
        let cleared = self.watches.get_mut(id)?.stage1.take();
        self.prune(id);
        cleared
    }

    pub fn start_stage2(&mut self, id: &str, baseline_name: &str) {
        self.watches.entry(id.to_string()).or_default().stage2 = Some(Stage2Watch {
            initial_name: baseline_name.to_string(),
            extraction_completed_observed: true,
            is_polling: true,
            start_time: Utc::now(),
        });
    }

    pub fn clear_stage2(&mut self, id: &str) -> Option<Stage2Watch> {
        let cleared = self.watches.get_mut(id)?.stage2.take();
        self.prune(id);
        cleared
    }

    pub fn stage1(&self, id: &str) -> Option<&Stage1Watch> {
        self.watches.get(id).and_then(|w| w.stage1.as_ref())
    }

    pub fn stage2(&self, id: &str) -> Option<&Stage2Watch> {
        self.watches.get(id).and_then(|w| w.stage2.as_ref())
    }

    pub fn watches(&self, id: &str) -> Option<&UsecaseWatches> {
        self.watches.get(id)
    }

    /// Number of usecases with at least one watch.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    fn prune(&mut self, id: &str) {
        if self.watches.get(id).is_some_and(UsecaseWatches::is_empty) {
            self.watches.remove(id);
        }
    }
}
