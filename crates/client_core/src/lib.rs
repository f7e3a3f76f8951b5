use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::{ApiErrorBody, ApiException};
use shared::protocol::{
    AccuracyReport, AccuracyRequest, BackendInfo, CorrectRequest, CorrectResponse, DatasetStats,
    SamplesResponse,
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod lifecycle;
pub mod ops;
pub mod render;

pub use lifecycle::{AlreadyPending, Operation, OperationState, OperationView};
pub use ops::ValidationError;

/// Requests that outlive this are failed rather than left outstanding
/// forever; the backend batch test is the slowest call by far.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to reach the correction service: {0}")]
    Transport(reqwest::Error),
    #[error("correction service returned {status}")]
    Status { status: StatusCode },
    #[error("malformed response from the correction service: {0}")]
    MalformedResponse(reqwest::Error),
}

/// HTTP client for the spell-correction backend.
///
/// One instance is shared by all operations; each method is a single
/// request/response exchange with the payload validated at this boundary.
pub struct SpellServiceClient {
    http: Client,
    server_url: String,
}

impl SpellServiceClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            http,
            server_url: server_url.into(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn backend_info(&self) -> Result<BackendInfo, ClientError> {
        self.get_json("/api/info").await
    }

    pub async fn correct(&self, text: &str) -> Result<CorrectResponse, ClientError> {
        self.post_json(
            "/api/correct",
            &CorrectRequest {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn dataset_stats(&self) -> Result<DatasetStats, ClientError> {
        self.get_json("/api/dataset/stats").await
    }

    pub async fn random_samples(&self, count: u32) -> Result<SamplesResponse, ClientError> {
        debug!(count, "fetching random dataset samples");
        let response = self
            .http
            .get(format!("{}/api/dataset/samples", self.server_url))
            .query(&[("count", count)])
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Self::decode(response).await
    }

    pub async fn test_accuracy(&self, sample_size: u32) -> Result<AccuracyReport, ClientError> {
        self.post_json("/api/dataset/test-accuracy", &AccuracyRequest { sample_size })
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path, "issuing GET request");
        let response = self
            .http
            .get(format!("{}{path}", self.server_url))
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        debug!(path, "issuing POST request");
        let response = self
            .http
            .post(format!("{}{path}", self.server_url))
            .json(body)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Self::decode(response).await
    }

    /// 4xx and 5xx are treated uniformly; a 2xx body that fails to parse is
    /// a distinct malformed-response failure.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            // The backend attaches an error body when it can; it only
            // reaches the log, the caller keys off the status alone.
            if let Ok(body) = response.json::<ApiErrorBody>().await {
                warn!(%status, reason = %ApiException::from(body), "request rejected");
            }
            return Err(ClientError::Status { status });
        }
        response.json().await.map_err(ClientError::MalformedResponse)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
