//! Terminal workflow results.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::types::{lenient_timestamp, JsonMap, Timestamp};
use crate::workflow::WorkflowState;

/// Per-stage output of the orchestrator pipeline.
///
/// Each stage is independently optional: `None` means the stage did not run
/// or did not apply to this configuration. Stages this client does not know
/// about are kept in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_analysis: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_analysis: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_parsing: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_tests: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_execution: Option<serde_json::Value>,
    #[serde(flatten)]
    pub other: JsonMap,
}

impl StageResults {
    /// Known stages in pipeline order, paired with their output.
    pub fn stages(&self) -> [(&'static str, Option<&serde_json::Value>); 7] {
        [
            ("authentication", self.authentication.as_ref()),
            ("website_analysis", self.website_analysis.as_ref()),
            ("screenshots", self.screenshots.as_ref()),
            ("figma_analysis", self.figma_analysis.as_ref()),
            ("requirements_parsing", self.requirements_parsing.as_ref()),
            ("unified_tests", self.unified_tests.as_ref()),
            ("test_execution", self.test_execution.as_ref()),
        ]
    }

    /// Number of known stages that produced output.
    pub fn completed_stage_count(&self) -> usize {
        self.stages().iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Payload of `GET /workflows/{id}/results`.
///
/// Created once and never mutated after it is stored. Decodes both the flat
/// form (stages directly under `results`) and the orchestrator's nested form,
/// where stages sit under `results.workflow_results` next to `errors` and
/// `service_statuses`. Always serializes flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireResults")]
pub struct WorkflowResults {
    pub workflow_id: String,
    pub status: WorkflowState,
    /// Execution duration in seconds.
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub results: StageResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_statuses: Option<BTreeMap<String, bool>>,
    #[serde(
        default,
        with = "lenient_timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<Timestamp>,
}

impl WorkflowResults {
    /// Services that reported failure, in name order.
    pub fn failed_services(&self) -> Vec<&str> {
        self.service_statuses
            .iter()
            .flatten()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Deserialize)]
struct WireResults {
    workflow_id: String,
    status: WorkflowState,
    #[serde(default)]
    execution_time: Option<f64>,
    #[serde(default)]
    results: WireResultsBody,
    #[serde(default)]
    errors: Option<Vec<String>>,
    #[serde(default)]
    service_statuses: Option<BTreeMap<String, bool>>,
    #[serde(default, with = "lenient_timestamp::option")]
    completed_at: Option<Timestamp>,
}

#[derive(Default, Deserialize)]
struct WireResultsBody {
    #[serde(default)]
    workflow_results: Option<StageResults>,
    #[serde(default)]
    errors: Option<Vec<String>>,
    #[serde(default)]
    service_statuses: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    execution_time: Option<f64>,
    // Mirrors the terminal state; `status` already carries it.
    #[serde(default, rename = "success")]
    _success: Option<IgnoredAny>,
    #[serde(flatten)]
    stages: StageResults,
}

impl From<WireResults> for WorkflowResults {
    fn from(wire: WireResults) -> Self {
        let body = wire.results;
        Self {
            workflow_id: wire.workflow_id,
            status: wire.status,
            execution_time: wire.execution_time.or(body.execution_time),
            results: body.workflow_results.unwrap_or(body.stages),
            errors: wire.errors.or(body.errors),
            service_statuses: wire.service_statuses.or(body.service_statuses),
            completed_at: wire.completed_at,
        }
    }
}
