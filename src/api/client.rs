//! REST client for the usecase backend.
//!
//! Uses reqwest with optional Bearer token auth. All paths are resolved
//! against the configured `baseUrl`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::UsecaseApi;
use crate::error::SyncError;
use crate::types::{CreateUsecaseRequest, ExtractionStatus, SyncConfig, Usecase};

pub struct HttpUsecaseApi {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
    owner_id: Option<String>,
    timeout_secs: u64,
}

impl HttpUsecaseApi {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        // Url::join drops the last path segment unless the base ends with '/'.
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| SyncError::Config(format!("Invalid baseUrl '{}': {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            owner_id: config.owner_id.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::Config(format!("Invalid endpoint path '{}': {}", path, e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout_secs)
        } else {
            SyncError::Network(err.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Http { status, body });
        }

        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SyncError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }
}

#[async_trait]
impl UsecaseApi for HttpUsecaseApi {
    async fn list_usecases(&self) -> Result<Vec<Usecase>, SyncError> {
        let mut url = self.endpoint("usecases")?;
        if let Some(owner) = &self.owner_id {
            url.query_pairs_mut().append_pair("ownerId", owner);
        }
        self.send_json(self.client.get(url)).await
    }

    async fn get_extraction_status(&self, id: &str) -> Result<ExtractionStatus, SyncError> {
        let url = self.endpoint(&format!("usecases/{}/extraction-status", id))?;
        match self.send_json(self.client.get(url)).await {
            Err(SyncError::Http { status: 404, .. }) => Err(SyncError::NotFound(id.to_string())),
            other => other,
        }
    }

    async fn create_usecase(&self, request: &CreateUsecaseRequest) -> Result<Usecase, SyncError> {
        let url = self.endpoint("usecases")?;
        self.send_json(self.client.post(url).json(request)).await
    }

    async fn patch_selected_model(&self, id: &str, model_id: &str) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("usecases/{}/selected-model", id))?;
        let body = serde_json::json!({ "modelId": model_id });
        match self.send(self.client.patch(url).json(&body)).await {
            Ok(_) => Ok(()),
            Err(SyncError::Http { status: 404, .. }) => Err(SyncError::NotFound(id.to_string())),
            Err(e) => Err(e),
        }
    }
}
