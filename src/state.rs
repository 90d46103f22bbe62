use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::UsecaseApi;
use crate::error::SyncError;
use crate::events::EventBus;
use crate::models::ModelCatalog;
use crate::naming::stage1::Stage1Poller;
use crate::naming::stage2::Stage2Poller;
use crate::snapshot::SnapshotStore;
use crate::tracker::StageTracker;
use crate::types::SyncConfig;

/// Environment override for `apiToken`.
pub const TOKEN_ENV_VAR: &str = "USECASE_SYNC_TOKEN";

/// Shared sync state, handed to background tasks as `Arc<AppState>`.
///
/// Lock order when nesting: stage poller, then tracker. No guard is held
/// across an `.await`.
pub struct AppState {
    pub config: SyncConfig,
    pub api: Arc<dyn UsecaseApi>,
    pub store: SnapshotStore,
    pub tracker: Mutex<StageTracker>,
    /// The single usecase being watched.
    pub active: Mutex<Option<String>>,
    pub stage1: Mutex<Stage1Poller>,
    pub stage2: Mutex<Stage2Poller>,
    pub bus: EventBus,
    pub models: ModelCatalog,
    /// Wakes the periodic refresh poller early.
    pub refresh_wake: Notify,
}

impl AppState {
    pub fn new(config: SyncConfig, api: Arc<dyn UsecaseApi>) -> Self {
        let bus = EventBus::new(config.event_bus_capacity);
        let models = ModelCatalog::new(config.models.clone());
        Self {
            config,
            api,
            store: SnapshotStore::new(),
            tracker: Mutex::new(StageTracker::new()),
            active: Mutex::new(None),
            stage1: Mutex::new(Stage1Poller::new()),
            stage2: Mutex::new(Stage2Poller::new()),
            bus,
            models,
            refresh_wake: Notify::new(),
        }
    }

    pub fn active_id(&self) -> Option<String> {
        self.active.lock().clone()
    }

    /// Abort both stage timers, in-flight fetches included.
    pub fn shutdown(&self) {
        self.stage1.lock().abort();
        self.stage2.lock().abort();
    }
}

/// Get the canonical config file path (~/.usecase-sync/config.json)
pub fn config_path() -> Result<PathBuf, SyncError> {
    let home = dirs::home_dir()
        .ok_or_else(|| SyncError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".usecase-sync").join("config.json"))
}

/// Load config from `path`, or the canonical path when `None`.
///
/// A missing file yields defaults. `USECASE_SYNC_TOKEN` overrides the
/// token from the file.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig, SyncError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            SyncError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?
    } else {
        log::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        SyncConfig::default()
    };

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            config.api_token = Some(token);
        }
    }

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SyncConfig) -> Result<(), SyncError> {
    if config.stage1_interval_ms == 0 || config.stage2_interval_ms == 0 {
        return Err(SyncError::Config(
            "Stage poll intervals must be greater than zero".to_string(),
        ));
    }
    if config.stage1_max_attempts == 0 || config.stage2_max_attempts == 0 {
        return Err(SyncError::Config(
            "Stage attempt budgets must be greater than zero".to_string(),
        ));
    }
    if config.refresh_interval_secs == 0 {
        return Err(SyncError::Config(
            "refreshIntervalSecs must be greater than zero".to_string(),
        ));
    }
    if config.event_bus_capacity == 0 {
        return Err(SyncError::Config(
            "eventBusCapacity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_state(api: Arc<crate::api::fake::FakeApi>) -> Arc<AppState> {
    Arc::new(AppState::new(SyncConfig::default(), api))
}
