//! Read-only model catalog used to validate model selection.

use crate::types::ModelInfo;

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// An empty catalog means no catalog was configured; nothing is rejected.
    pub fn accepts(&self, model_id: &str) -> bool {
        self.models.is_empty() || self.get(model_id).is_some()
    }
}
