//! HTTP client for the experiment endpoints

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::error::{ClientError, ClientResult};
use crate::client::ClientConfig;
use crate::registry::{ExperimentDefinition, ExperimentKey, ExperimentRecord};

/// Thin async client over `/api/experiments`
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Server root this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn experiments_url(&self) -> String {
        format!("{}/api/experiments", self.base_url)
    }

    fn experiment_url(&self, key: &ExperimentKey) -> String {
        format!("{}/api/experiments/{}/{}", self.base_url, key.namespace, key.name)
    }

    /// GET /api/experiments
    pub async fn list(&self) -> ClientResult<Vec<ExperimentRecord>> {
        let response = self.http.get(self.experiments_url()).send().await?;
        decode(response).await
    }

    /// GET /api/experiments/:namespace/:name
    pub async fn get(&self, key: &ExperimentKey) -> ClientResult<ExperimentRecord> {
        let response = self.http.get(self.experiment_url(key)).send().await?;
        decode(response).await
    }

    /// POST /api/experiments
    pub async fn create(&self, definition: &ExperimentDefinition) -> ClientResult<ExperimentRecord> {
        let response = self
            .http
            .post(self.experiments_url())
            .json(definition)
            .send()
            .await?;
        decode(response).await
    }

    /// DELETE /api/experiments/:namespace/:name
    pub async fn delete(&self, key: &ExperimentKey) -> ClientResult<()> {
        let response = self.http.delete(self.experiment_url(key)).send().await?;
        check(response).await.map(drop)
    }
}

async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    debug!(status = status.as_u16(), "Request failed: {}", body);
    Err(ClientError::from_status(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let body = check(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}
