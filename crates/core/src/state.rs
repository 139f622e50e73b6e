//! The controller's aggregate state and its transitions.
//!
//! [`ControllerState`] is a plain value. The lifecycle crate wraps it in an
//! owned store and applies these transitions atomically; keeping them here
//! as synchronous methods makes every invariant testable without a runtime.

use crate::health::ServiceHealthResponse;
use crate::results::WorkflowResults;
use crate::types::Timestamp;
use crate::workflow::{clamp_progress, WorkflowConfig, WorkflowStatus};

/// Coarse lifecycle position derived from [`ControllerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// No workflow and no start in flight.
    Idle,
    /// Start request in flight.
    Starting,
    /// Workflow known, status not yet terminal.
    Polling,
    /// Status is `completed`/`failed` but results are not stored yet
    /// (fetch in flight, or it failed and `error` is set).
    TerminalFetching,
    /// Results stored, or the workflow was cancelled.
    Done,
}

/// What the poll loop should do after a status snapshot was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Snapshot belongs to another workflow (stale) and was dropped.
    Ignored,
    /// Non-terminal; schedule the next poll.
    Continue,
    /// `completed` or `failed`; fetch results and stop polling.
    FetchResults,
    /// `cancelled`; stop polling without fetching results.
    Stop,
}

/// Process-wide workflow state.
///
/// Invariants:
/// - `results` is only set while `current_workflow` is in a terminal state
///   that yields results.
/// - Starting a workflow clears `results` and `error` but keeps
///   `service_health`.
/// - [`reset`](Self::reset) clears the workflow fields and nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub config: Option<WorkflowConfig>,
    pub current_workflow: Option<WorkflowStatus>,
    pub results: Option<WorkflowResults>,
    pub service_health: Option<ServiceHealthResponse>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ControllerState {
    pub fn phase(&self) -> LifecyclePhase {
        if self.loading {
            return LifecyclePhase::Starting;
        }
        match &self.current_workflow {
            None => LifecyclePhase::Idle,
            Some(wf) if !wf.status.is_terminal() => LifecyclePhase::Polling,
            Some(wf) if wf.status.yields_results() && self.results.is_none() => {
                LifecyclePhase::TerminalFetching
            }
            Some(_) => LifecyclePhase::Done,
        }
    }

    /// Identifier of the workflow currently tracked, if any.
    pub fn workflow_id(&self) -> Option<&str> {
        self.current_workflow
            .as_ref()
            .map(|wf| wf.workflow_id.as_str())
    }

    /// Enter `Starting`: store the config and drop everything from the
    /// previous run except service health.
    pub fn begin_start(&mut self, config: WorkflowConfig) {
        self.config = Some(config);
        self.current_workflow = None;
        self.results = None;
        self.error = None;
        self.loading = true;
    }

    /// The start call succeeded; synthesize the initial status.
    pub fn start_succeeded(&mut self, workflow_id: &str, now: Timestamp) {
        self.current_workflow = Some(WorkflowStatus::initial(workflow_id, now));
        self.loading = false;
    }

    /// The start call failed; no workflow is tracked.
    pub fn start_failed(&mut self, message: String) {
        self.current_workflow = None;
        self.error = Some(message);
        self.loading = false;
    }

    /// Replace the status snapshot wholesale.
    ///
    /// Snapshots for a workflow other than the current one are ignored.
    /// Progress is clamped against the previous snapshot.
    pub fn apply_status(&mut self, mut status: WorkflowStatus) -> StatusOutcome {
        let previous = match &self.current_workflow {
            Some(current) if current.workflow_id == status.workflow_id => current.progress,
            _ => return StatusOutcome::Ignored,
        };

        status.progress = clamp_progress(Some(previous), status.progress, status.status);
        let state = status.status;
        self.current_workflow = Some(status);
        if !state.yields_results() {
            self.results = None;
        }

        if state.yields_results() {
            StatusOutcome::FetchResults
        } else if state.is_terminal() {
            StatusOutcome::Stop
        } else {
            StatusOutcome::Continue
        }
    }

    /// Store terminal results.
    ///
    /// Returns `false` (and stores nothing) when the results belong to
    /// another workflow, the current status does not yield results, or
    /// results are already stored for this run.
    pub fn apply_results(&mut self, results: WorkflowResults) -> bool {
        if self.results.is_some() {
            return false;
        }
        let accepted = self.current_workflow.as_ref().is_some_and(|wf| {
            wf.workflow_id == results.workflow_id && wf.status.yields_results()
        });
        if accepted {
            self.results = Some(results);
        }
        accepted
    }

    /// Record an error raised on behalf of `workflow_id`; dropped when
    /// that workflow is no longer the current one.
    pub fn record_workflow_error(&mut self, workflow_id: &str, message: String) -> bool {
        if self.workflow_id() != Some(workflow_id) {
            return false;
        }
        self.error = Some(message);
        true
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_service_health(&mut self, health: ServiceHealthResponse) {
        self.service_health = Some(health);
    }

    /// Clear `config`, `current_workflow`, `results` and `error`.
    /// `service_health` is left untouched.
    pub fn reset(&mut self) {
        self.config = None;
        self.current_workflow = None;
        self.results = None;
        self.error = None;
        self.loading = false;
    }
}
