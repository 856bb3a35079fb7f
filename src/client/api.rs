use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::api::job::models::JobSummary;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Api(String),
}

/// Query sent to `GET /jobs`. Empty filters are left out of the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsRequest {
    pub offset: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub job_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort_by: String,
}

/// Source of listing pages for the scroll controller
#[async_trait]
pub trait JobsApi: Send + Sync + 'static {
    async fn list_jobs(&self, request: &JobsRequest) -> Result<Vec<JobSummary>, ClientError>;
}

#[async_trait]
impl<T: JobsApi + ?Sized> JobsApi for Arc<T> {
    async fn list_jobs(&self, request: &JobsRequest) -> Result<Vec<JobSummary>, ClientError> {
        (**self).list_jobs(request).await
    }
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Vec<JobSummary>>,
    #[serde(default)]
    error: Option<String>,
}

/// `JobsApi` over HTTP
#[derive(Clone, Debug)]
pub struct HttpJobsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn request(&self, request: &JobsRequest) -> reqwest::RequestBuilder {
        self.client.get(format!("{}/jobs", self.base_url)).query(request)
    }
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn list_jobs(&self, request: &JobsRequest) -> Result<Vec<JobSummary>, ClientError> {
        let response = self.request(request).send().await?;
        let status = response.status();
        debug!("GET {} -> {}", response.url(), status);

        if !status.is_success() {
            let message = response
                .json::<ListingEnvelope>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ListingEnvelope = response.json().await?;
        if !body.success {
            return Err(ClientError::Api(
                body.error.unwrap_or_else(|| "Failed to fetch jobs".to_string()),
            ));
        }
        Ok(body.data.unwrap_or_default())
    }
}
