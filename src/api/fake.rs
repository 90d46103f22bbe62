//! In-memory `UsecaseApi` for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use super::UsecaseApi;
use crate::error::SyncError;
use crate::types::{CreateUsecaseRequest, ExtractionStatus, Usecase, EXTRACTION_COMPLETED};

pub(crate) fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub(crate) fn usecase(id: &str, name: &str, updated_secs: i64) -> Usecase {
    Usecase {
        id: id.to_string(),
        owner_id: "owner-1".to_string(),
        display_name: name.to_string(),
        status: "active".to_string(),
        created_at: Some(ts(0)),
        updated_at: Some(ts(updated_secs)),
    }
}

struct ScheduledRename {
    on_call: usize,
    id: String,
    name: String,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    usecases: Mutex<Vec<Usecase>>,
    extraction: Mutex<HashMap<String, ExtractionStatus>>,
    renames: Mutex<Vec<ScheduledRename>>,
    list_delay: Mutex<Option<Duration>>,
    fail_lists: AtomicBool,
    list_calls: AtomicUsize,
    status_calls: AtomicUsize,
    created: AtomicUsize,
    patched_models: Mutex<Vec<(String, String)>>,
}

impl FakeApi {
    pub(crate) fn with_usecases(usecases: Vec<Usecase>) -> Self {
        let api = Self::default();
        *api.usecases.lock() = usecases;
        api
    }

    pub(crate) fn set_usecases(&self, usecases: Vec<Usecase>) {
        *self.usecases.lock() = usecases;
    }

    pub(crate) fn rename_now(&self, id: &str, name: &str) {
        if let Some(u) = self.usecases.lock().iter_mut().find(|u| u.id == id) {
            u.display_name = name.to_string();
        }
    }

    /// Rename `id` when the `on_call`-th list request (1-based) arrives.
    pub(crate) fn rename_on_list_call(&self, on_call: usize, id: &str, name: &str) {
        self.renames.lock().push(ScheduledRename {
            on_call,
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    pub(crate) fn set_extraction(&self, id: &str, text_extraction: &str) {
        self.extraction.lock().insert(
            id.to_string(),
            ExtractionStatus {
                text_extraction: text_extraction.to_string(),
                status: "ready".to_string(),
            },
        );
    }

    pub(crate) fn set_extraction_completed(&self, id: &str) {
        self.set_extraction(id, EXTRACTION_COMPLETED);
    }

    pub(crate) fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock() = Some(delay);
    }

    pub(crate) fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn patched_models(&self) -> Vec<(String, String)> {
        self.patched_models.lock().clone()
    }
}

#[async_trait]
impl UsecaseApi for FakeApi {
    async fn list_usecases(&self) -> Result<Vec<Usecase>, SyncError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let due: Vec<(String, String)> = {
            let mut renames = self.renames.lock();
            let (due, pending): (Vec<_>, Vec<_>) =
                renames.drain(..).partition(|r| r.on_call <= call);
            *renames = pending;
            due.into_iter().map(|r| (r.id, r.name)).collect()
        };
        for (id, name) in due {
            self.rename_now(&id, &name);
        }

        let delay = *self.list_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(SyncError::Network("connection reset".to_string()));
        }
        Ok(self.usecases.lock().clone())
    }

    async fn get_extraction_status(&self, id: &str) -> Result<ExtractionStatus, SyncError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .extraction
            .lock()
            .get(id)
            .cloned()
            .unwrap_or(ExtractionStatus {
                text_extraction: "Pending".to_string(),
                status: "ready".to_string(),
            }))
    }

    async fn create_usecase(&self, request: &CreateUsecaseRequest) -> Result<Usecase, SyncError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Usecase {
            id: format!("new-{}", n),
            owner_id: request.owner_id.clone(),
            display_name: request.name.clone(),
            status: "active".to_string(),
            created_at: Some(ts(10_000)),
            updated_at: Some(ts(10_000)),
        };
        self.usecases.lock().insert(0, created.clone());
        Ok(created)
    }

    async fn patch_selected_model(&self, id: &str, model_id: &str) -> Result<(), SyncError> {
        if !self.usecases.lock().iter().any(|u| u.id == id) {
            return Err(SyncError::NotFound(id.to_string()));
        }
        self.patched_models
            .lock()
            .push((id.to_string(), model_id.to_string()));
        Ok(())
    }
}
