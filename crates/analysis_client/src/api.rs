//! REST client for the analysis API.
//!
//! Wraps the result, video, task and jersey-mapping endpoints using
//! [`reqwest`]. Every call is reported through
//! [`observability::record_api_request`].

use std::time::Duration;

use contracts::{
    AnalysisResults, AnalysisTask, ApiConfig, JerseyMappingsResponse, SetJerseyMappingRequest,
    TrackId, Video,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{ClientError, Result};

/// Fetches analysis task status
///
/// The polling progress source only needs this one endpoint; tests swap in
/// scripted fetchers.
#[trait_variant::make(TaskStatusFetcher: Send)]
pub trait LocalTaskStatusFetcher {
    async fn fetch_task_status(&self, task_id: &str) -> Result<AnalysisTask>;
}

/// HTTP client for one analysis API instance
#[derive(Debug, Clone)]
pub struct AnalysisApi {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisApi {
    /// Build a client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_s))
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /results/{video_id}`
    #[instrument(skip(self))]
    pub async fn get_results(&self, video_id: &str) -> Result<AnalysisResults> {
        let url = self.url(&format!("/results/{video_id}"));
        self.get_json("results", &url).await
    }

    /// `GET /videos/{video_id}`
    #[instrument(skip(self))]
    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        let url = self.url(&format!("/videos/{video_id}"));
        self.get_json("video", &url).await
    }

    /// `GET /analysis/{task_id}`
    #[instrument(skip(self))]
    pub async fn get_task_status(&self, task_id: &str) -> Result<AnalysisTask> {
        let url = self.url(&format!("/analysis/{task_id}"));
        self.get_json("task_status", &url).await
    }

    /// `GET /videos/{video_id}/jersey-mappings`
    #[instrument(skip(self))]
    pub async fn get_jersey_mappings(&self, video_id: &str) -> Result<JerseyMappingsResponse> {
        let url = self.url(&format!("/videos/{video_id}/jersey-mappings"));
        self.get_json("jersey_mappings", &url).await
    }

    /// `POST /videos/{video_id}/jersey-mapping`
    #[instrument(skip(self, request), fields(video_id = %request.video_id, track_id = request.track_id))]
    pub async fn set_jersey_mapping(&self, request: &SetJerseyMappingRequest) -> Result<()> {
        let url = self.url(&format!("/videos/{}/jersey-mapping", request.video_id));
        let result = async {
            let response = self.client.post(&url).json(request).send().await?;
            Self::ensure_success(response).await.map(|_| ())
        }
        .await;
        observability::record_api_request("set_jersey_mapping", result.is_ok());
        result
    }

    /// `DELETE /videos/{video_id}/jersey-mapping/{track_id}`
    #[instrument(skip(self))]
    pub async fn delete_jersey_mapping(&self, video_id: &str, track_id: TrackId) -> Result<()> {
        let url = self.url(&format!("/videos/{video_id}/jersey-mapping/{track_id}"));
        let result = async {
            let response = self.client.delete(&url).send().await?;
            Self::ensure_success(response).await.map(|_| ())
        }
        .await;
        observability::record_api_request("delete_jersey_mapping", result.is_ok());
        result
    }

    // ---- private helpers ----

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: &str) -> Result<T> {
        debug!(endpoint, url, "GET");
        let result = async {
            let response = self.client.get(url).send().await?;
            Self::parse_response(endpoint, response).await
        }
        .await;
        observability::record_api_request(endpoint, result.is_ok());
        result
    }

    /// Return the response unchanged on success, or an [`ClientError::Api`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { endpoint, source })
    }
}

impl TaskStatusFetcher for AnalysisApi {
    async fn fetch_task_status(&self, task_id: &str) -> Result<AnalysisTask> {
        self.get_task_status(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = AnalysisApi::with_client(reqwest::Client::new(), "http://host:8000/");
        assert_eq!(api.base_url(), "http://host:8000");
        assert_eq!(api.url("/results/v1"), "http://host:8000/results/v1");
    }

    #[test]
    fn test_new_from_config() {
        let api = AnalysisApi::new(&ApiConfig::default()).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".into(),
            request_timeout_s: 2,
            ..Default::default()
        };
        let api = AnalysisApi::new(&config).unwrap();
        let err = api.get_video("v1").await.unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
        assert_eq!(err.status(), None);
    }
}
