//! Collaborator API consumed by the sync engine.
//!
//! The engine only depends on the `UsecaseApi` trait; `client` provides the
//! REST/JSON implementation used by the daemon.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::{CreateUsecaseRequest, ExtractionStatus, Usecase};

pub use client::HttpUsecaseApi;

/// Minimum backend contract the sync engine requires.
#[async_trait]
pub trait UsecaseApi: Send + Sync {
    /// Full usecase snapshot, server order, no pagination.
    async fn list_usecases(&self) -> Result<Vec<Usecase>, SyncError>;

    /// Document text-extraction status for one usecase.
    async fn get_extraction_status(&self, id: &str) -> Result<ExtractionStatus, SyncError>;

    async fn create_usecase(&self, request: &CreateUsecaseRequest) -> Result<Usecase, SyncError>;

    async fn patch_selected_model(&self, id: &str, model_id: &str) -> Result<(), SyncError>;
}
