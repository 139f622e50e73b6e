//! REST API client for the workflow orchestrator.
//!
//! Wraps the orchestrator HTTP API (workflow submission, status polling,
//! results retrieval, cancellation, service health) using [`reqwest`].
//! There is no business logic here and no retries: each call is a single
//! attempt that either yields a typed payload or an [`ApiError`].

use std::time::Duration;

use qaflow_core::health::ServiceHealthResponse;
use qaflow_core::results::WorkflowResults;
use qaflow_core::workflow::{
    CancelWorkflowResponse, StartWorkflowResponse, WorkflowConfig, WorkflowList, WorkflowStatus,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

/// Upper bound applied to every request unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a single orchestrator origin.
#[derive(Debug, Clone)]
pub struct WorkflowApi {
    client: reqwest::Client,
    base_url: Url,
}

/// Errors from the orchestrator REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (connection refused, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The orchestrator returned a non-2xx status code.
    #[error("Orchestrator API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not match the expected structure.
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded but violates the endpoint contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Whether the failure happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// HTTP status for protocol failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl WorkflowApi {
    /// Create a client for the orchestrator at `base_url`.
    ///
    /// * `base_url` - origin (optionally with a path prefix), e.g. `http://host:8006`.
    /// * `timeout`  - bound applied to every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Self::with_client(client, base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    ///
    /// The caller is responsible for configuring headers and timeouts on it.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(format!(
                "'{base_url}' must be an http(s) origin"
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit a workflow configuration.
    ///
    /// Sends `POST /workflows/start`. Returns the server-assigned
    /// workflow identifier; an empty identifier is treated as a shape
    /// failure.
    pub async fn start_workflow(
        &self,
        config: &WorkflowConfig,
    ) -> Result<StartWorkflowResponse, ApiError> {
        let response = self
            .request(Method::POST, &["workflows", "start"])?
            .json(config)
            .send()
            .await?;

        let started: StartWorkflowResponse = Self::parse_response(response, "workflows/start").await?;
        if started.workflow_id.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "start response carried an empty workflow_id".to_string(),
            ));
        }

        tracing::info!(
            workflow_id = %started.workflow_id,
            ack = %started.status,
            "Workflow submitted",
        );
        Ok(started)
    }

    /// Retrieve the current status snapshot of a workflow.
    ///
    /// Sends `GET /workflows/{id}/status`. Unknown identifiers come back
    /// as [`ApiError::Api`] with status 404.
    pub async fn get_workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus, ApiError> {
        let response = self
            .request(Method::GET, &["workflows", workflow_id, "status"])?
            .send()
            .await?;

        let status: WorkflowStatus = Self::parse_response(response, "workflows/{id}/status").await?;
        Self::ensure_same_workflow(workflow_id, &status.workflow_id)?;
        Ok(status)
    }

    /// Retrieve the terminal results of a workflow.
    ///
    /// Sends `GET /workflows/{id}/results`. No terminal-state check is
    /// made here; that is the controller's job.
    pub async fn get_workflow_results(
        &self,
        workflow_id: &str,
    ) -> Result<WorkflowResults, ApiError> {
        let response = self
            .request(Method::GET, &["workflows", workflow_id, "results"])?
            .send()
            .await?;

        let results: WorkflowResults = Self::parse_response(response, "workflows/{id}/results").await?;
        Self::ensure_same_workflow(workflow_id, &results.workflow_id)?;
        Ok(results)
    }

    /// Retrieve the aggregate health of the backing services.
    ///
    /// Sends `GET /service-status`.
    pub async fn get_service_health(&self) -> Result<ServiceHealthResponse, ApiError> {
        let response = self.request(Method::GET, &["service-status"])?.send().await?;
        Self::parse_response(response, "service-status").await
    }

    /// List all workflows known to the orchestrator.
    ///
    /// Sends `GET /workflows`.
    pub async fn list_workflows(&self) -> Result<WorkflowList, ApiError> {
        let response = self.request(Method::GET, &["workflows"])?.send().await?;
        Self::parse_response(response, "workflows").await
    }

    /// Request cancellation of a workflow.
    ///
    /// Sends `DELETE /workflows/{id}`. A running workflow moves to
    /// `cancelled`; a finished one is removed from the orchestrator's
    /// active list.
    pub async fn cancel_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<CancelWorkflowResponse, ApiError> {
        let response = self
            .request(Method::DELETE, &["workflows", workflow_id])?
            .send()
            .await?;

        Self::parse_response(response, "workflows/{id}").await
    }

    /// Lightweight liveness check against `GET /health`.
    ///
    /// Never fails: transport errors and non-2xx responses are reported
    /// as `false`.
    pub async fn check_liveness(&self) -> bool {
        let request = match self.request(Method::GET, &["health"]) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Liveness check could not be built");
                return false;
            }
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Liveness check failed");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Liveness check unreachable");
                false
            }
        }
    }

    // ---- private helpers ----

    /// Build a request for the endpoint made of `segments` under the base
    /// URL. Each segment is percent-encoded.
    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        tracing::debug!(%method, %url, "Building orchestrator request");
        Ok(self.client.request(method, url))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] containing
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// Decoding goes through the body text so that shape failures are
    /// reported as [`ApiError::Decode`] rather than transport errors.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn ensure_same_workflow(requested: &str, returned: &str) -> Result<(), ApiError> {
        if requested != returned {
            return Err(ApiError::InvalidResponse(format!(
                "requested workflow {requested} but received {returned}"
            )));
        }
        Ok(())
    }
}
