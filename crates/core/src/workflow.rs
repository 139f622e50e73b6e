//! Workflow configuration, status snapshots, and the status vocabulary
//! reported by the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::types::{lenient_timestamp, JsonMap, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound of the progress percentage.
pub const PROGRESS_MIN: f64 = 0.0;

/// Upper bound of the progress percentage.
pub const PROGRESS_MAX: f64 = 100.0;

/// Step description shown for the locally synthesized initial status.
pub const INITIAL_STEP: &str = "Starting workflow";

// ---------------------------------------------------------------------------
// Workflow state
// ---------------------------------------------------------------------------

/// Server-reported state of a workflow. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Initializing,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowState {
    /// No further transitions occur after a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Terminal states whose results are fetched. `Cancelled` never yields results.
    pub fn yields_results(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which pipeline variant the orchestrator runs.
///
/// `Full` travels as `full_analysis`, the only value the orchestrator
/// recognises for the full pipeline; `full` is accepted on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Analysis and test generation only.
    Quick,
    /// Adds test execution and result analysis.
    #[default]
    #[serde(rename = "full_analysis", alias = "full")]
    Full,
}

impl WorkflowType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

/// How the orchestrator should authenticate against the target site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    FormBased,
    Oauth,
    Saml,
    BasicAuth,
    /// Let the remote auth manager detect the mechanism.
    Auto,
}

/// Credentials for the site under test.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub additional_fields: JsonMap,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_type", &self.auth_type)
            .field("additional_fields", &self.additional_fields)
            .finish()
    }
}

/// User-supplied input for one workflow run.
///
/// Immutable once submitted; the controller owns it for the duration of
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Target site URL.
    pub url: String,
    #[serde(default)]
    pub workflow_type: WorkflowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// Figma file key used as the design reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_file_key: Option<String>,
    /// Parsed requirements document handed to the orchestrator as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_data: Option<JsonMap>,
    #[serde(default)]
    pub options: JsonMap,
}

impl WorkflowConfig {
    /// A configuration with only the required fields set.
    pub fn new(url: impl Into<String>, workflow_type: WorkflowType) -> Self {
        Self {
            url: url.into(),
            workflow_type,
            credentials: None,
            figma_file_key: None,
            requirements_data: None,
            options: JsonMap::new(),
        }
    }
}

/// Check the structural shape of a configuration before submission.
///
/// Rules:
/// - `url` must be non-empty, parse as a URL, use `http` or `https`, and
///   name a host.
/// - `credentials`, when present, must carry a non-empty username.
/// - `figma_file_key`, when present, must be non-blank.
///
/// Business semantics are left to the orchestrator.
pub fn validate_workflow_config(config: &WorkflowConfig) -> Result<(), CoreError> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(CoreError::Validation("Target URL must not be empty".to_string()));
    }
    let parsed = Url::parse(url)
        .map_err(|e| CoreError::Validation(format!("Target URL is not valid ({e}): {url}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::Validation(format!(
            "Target URL must use http or https: {url}"
        )));
    }
    if !parsed.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(CoreError::Validation(format!(
            "Target URL must include a host: {url}"
        )));
    }

    if let Some(credentials) = &config.credentials {
        if credentials.username.trim().is_empty() {
            return Err(CoreError::Validation(
                "Credentials username must not be empty".to_string(),
            ));
        }
    }

    if let Some(key) = &config.figma_file_key {
        if key.trim().is_empty() {
            return Err(CoreError::Validation(
                "Design reference key must not be blank".to_string(),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Status snapshot
// ---------------------------------------------------------------------------

/// Progress snapshot reported by the orchestrator.
///
/// Replaced wholesale on every poll, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub workflow_id: String,
    pub status: WorkflowState,
    /// Percentage in `0..=100`.
    pub progress: f64,
    #[serde(default)]
    pub current_step: String,
    #[serde(with = "lenient_timestamp")]
    pub start_time: Timestamp,
    #[serde(default, with = "lenient_timestamp::option")]
    pub estimated_completion: Option<Timestamp>,
    #[serde(default)]
    pub results_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_preview: Option<JsonMap>,
}

impl WorkflowStatus {
    /// The status synthesized locally right after a successful start so
    /// that something can be rendered before the first poll returns.
    pub fn initial(workflow_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            status: WorkflowState::Initializing,
            progress: PROGRESS_MIN,
            current_step: INITIAL_STEP.to_string(),
            start_time: now,
            estimated_completion: None,
            results_available: false,
            results_preview: None,
        }
    }
}

/// Clamp a reported progress value.
///
/// The value is bounded to `0..=100` (NaN counts as no progress). While the
/// workflow is non-terminal a regression below `previous` keeps `previous`;
/// terminal snapshots keep the reported value since the failure path may
/// legitimately move backwards.
pub fn clamp_progress(previous: Option<f64>, reported: f64, state: WorkflowState) -> f64 {
    let bounded = if reported.is_nan() {
        PROGRESS_MIN
    } else {
        reported.clamp(PROGRESS_MIN, PROGRESS_MAX)
    };
    match previous {
        Some(prev) if !state.is_terminal() && bounded < prev => prev,
        _ => bounded,
    }
}

// ---------------------------------------------------------------------------
// Other wire payloads
// ---------------------------------------------------------------------------

/// Body returned by `POST /workflows/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartWorkflowResponse {
    pub workflow_id: String,
    /// Acknowledgement tag, e.g. `"started"`. Not a [`WorkflowState`].
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_url: Option<String>,
}

/// Body returned by `DELETE /workflows/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelWorkflowResponse {
    pub message: String,
}

/// One row of `GET /workflows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub status: WorkflowState,
    pub progress: f64,
    #[serde(with = "lenient_timestamp")]
    pub start_time: Timestamp,
    #[serde(default)]
    pub current_step: String,
}

/// Body returned by `GET /workflows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowList {
    pub total_workflows: u32,
    pub active_workflows: u32,
    pub completed_workflows: u32,
    #[serde(default)]
    pub workflows: Vec<WorkflowSummary>,
}
