use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat-like unit of work shown in the sidebar.
///
/// `display_name` starts as a placeholder (`"Chat {n}"`) and is replaced
/// by the backend naming jobs. The client never invents a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usecase {
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Usecase {
    /// Timestamp used for sidebar ordering.
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Value of `textExtraction` once the document pipeline has finished.
pub const EXTRACTION_COMPLETED: &str = "Completed";

/// Document text-extraction status for a usecase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStatus {
    #[serde(default)]
    pub text_extraction: String,
    #[serde(default)]
    pub status: String,
}

impl ExtractionStatus {
    pub fn is_completed(&self) -> bool {
        self.text_extraction == EXTRACTION_COMPLETED
    }
}

/// Body of the create-usecase request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUsecaseRequest {
    pub owner_id: String,
    pub name: String,
}

/// An entry in the read-only model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Sync configuration stored in ~/.usecase-sync/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Usecase to select on startup (headless daemon only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_usecase_id: Option<String>,
    #[serde(default = "default_stage_interval_ms")]
    pub stage1_interval_ms: u64,
    #[serde(default = "default_stage1_max_attempts")]
    pub stage1_max_attempts: u32,
    #[serde(default = "default_stage_interval_ms")]
    pub stage2_interval_ms: u64,
    #[serde(default = "default_stage2_max_attempts")]
    pub stage2_max_attempts: u32,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_stage_interval_ms() -> u64 {
    2000
}

fn default_stage1_max_attempts() -> u32 {
    15
}

// Document naming waits on extraction + generation upstream, so it gets
// twice the conversation-naming budget.
fn default_stage2_max_attempts() -> u32 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_event_bus_capacity() -> usize {
    64
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            owner_id: None,
            active_usecase_id: None,
            stage1_interval_ms: default_stage_interval_ms(),
            stage1_max_attempts: default_stage1_max_attempts(),
            stage2_interval_ms: default_stage_interval_ms(),
            stage2_max_attempts: default_stage2_max_attempts(),
            refresh_interval_secs: default_refresh_interval_secs(),
            event_bus_capacity: default_event_bus_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            models: Vec::new(),
        }
    }
}
