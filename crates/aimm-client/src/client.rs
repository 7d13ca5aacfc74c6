//! HTTP client for the model backend.
//!
//! Every call is a single attempt: failures are logged and returned, never
//! retried.

use std::time::Duration;

use aimm_core::{
    AimmConfig, Error, Factor, ModelRecord, Quality, Result, RetrainRequest, RetrainResponse,
    SaveResponse,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

pub const TARGETS_PATH: &str = "/api/target";
pub const FACTORS_PATH: &str = "/api/factors";
pub const MODELS_PATH: &str = "/api/models";
pub const RETRAIN_PATH: &str = "/retrain";

const SAVE_FAILED: &str = "Failed to save models.";

/// Thin JSON client over the backend endpoints.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AimmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("GET {} returned {}: {}", path, status, body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::MalformedResponse(format!("{}: {}", path, e)))
    }

    /// GET /api/target: factors eligible as model target.
    pub async fn targets(&self) -> Result<Vec<Factor>> {
        self.get_json(TARGETS_PATH).await
    }

    /// GET /api/factors: every factor, admin and user-created.
    pub async fn factors(&self) -> Result<Vec<Factor>> {
        self.get_json(FACTORS_PATH).await
    }

    /// GET /api/models: raw level-keyed model listing.
    pub async fn models(&self) -> Result<serde_json::Value> {
        self.get_json(MODELS_PATH).await
    }

    /// POST /retrain: ask the backend to score a model.
    pub async fn retrain(&self, request: &RetrainRequest) -> Result<Quality> {
        let url = self.url(RETRAIN_PATH);
        debug!("POST {} for model '{}'", url, request.name);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Error retraining model: {}", e);
                Error::Http(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Retrain returned {}: {}", status, body);
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: RetrainResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(format!("{}: {}", RETRAIN_PATH, e)))?;
        Ok(body.quality)
    }

    /// POST /api/models: persist a model record.
    ///
    /// A non-2xx answer becomes [`Error::Api`] carrying the server's `message`
    /// (or `error`) field.
    pub async fn save_model(&self, record: &ModelRecord) -> Result<SaveResponse> {
        let url = self.url(MODELS_PATH);
        debug!("POST {} for model '{}'", url, record.name);
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                error!("Error saving models: {}", e);
                Error::Http(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: SaveResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            let message = body
                .message
                .or(body.error)
                .unwrap_or_else(|| SAVE_FAILED.to_string());
            error!("Failed to save models ({}): {}", status, message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}
