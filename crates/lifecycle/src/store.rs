//! Owned container for [`ControllerState`].
//!
//! Backed by a [`tokio::sync::watch`] channel: every transition is a
//! synchronous closure applied under the channel's lock, and subscribers
//! are woken after each effective change. Readers get clones; only the
//! controller (inside this crate) can write.

use std::sync::Arc;

use qaflow_core::health::ServiceHealthResponse;
use qaflow_core::results::WorkflowResults;
use qaflow_core::state::{ControllerState, StatusOutcome};
use qaflow_core::types::Timestamp;
use qaflow_core::workflow::{WorkflowConfig, WorkflowStatus};
use tokio::sync::watch;

/// Shared handle to the controller state. Cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<ControllerState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// A store holding the empty process-start state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ControllerState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ControllerState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&ControllerState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receive a notification after every effective state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.tx.subscribe()
    }

    // ---- transitions (controller only) ----

    pub(crate) fn begin_start(&self, config: WorkflowConfig) {
        self.tx.send_modify(|state| state.begin_start(config));
    }

    pub(crate) fn start_succeeded(&self, workflow_id: &str, now: Timestamp) {
        self.tx
            .send_modify(|state| state.start_succeeded(workflow_id, now));
    }

    pub(crate) fn start_failed(&self, message: String) {
        self.tx.send_modify(|state| state.start_failed(message));
    }

    pub(crate) fn apply_status(&self, status: WorkflowStatus) -> StatusOutcome {
        let mut outcome = StatusOutcome::Ignored;
        self.tx.send_if_modified(|state| {
            outcome = state.apply_status(status);
            outcome != StatusOutcome::Ignored
        });
        outcome
    }

    pub(crate) fn apply_results(&self, results: WorkflowResults) -> bool {
        self.tx.send_if_modified(|state| state.apply_results(results))
    }

    pub(crate) fn record_workflow_error(&self, workflow_id: &str, message: String) -> bool {
        self.tx
            .send_if_modified(|state| state.record_workflow_error(workflow_id, message))
    }

    pub(crate) fn clear_error(&self) {
        self.tx.send_if_modified(|state| {
            let had_error = state.error.is_some();
            state.clear_error();
            had_error
        });
    }

    pub(crate) fn set_service_health(&self, health: ServiceHealthResponse) {
        self.tx.send_modify(|state| state.set_service_health(health));
    }

    pub(crate) fn reset(&self) {
        self.tx.send_modify(ControllerState::reset);
    }
}
