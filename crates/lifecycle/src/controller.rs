//! Workflow lifecycle controller.
//!
//! [`WorkflowController`] is the single writer of the [`StateStore`]. It
//! starts a workflow, owns the per-workflow poll task and the
//! process-lifetime health task, and exposes reset, cancel and error
//! dismissal. No public operation returns an error: every external failure
//! ends up as a human-readable string on `ControllerState::error`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use qaflow_client::WorkflowService;
use qaflow_core::workflow::WorkflowConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ControllerConfig, MIN_INTERVAL};
use crate::health;
use crate::poller::{self, PollContext};
use crate::store::StateStore;

/// Upper bound on waiting for a background task during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// What became of a [`WorkflowController::start`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The orchestrator accepted the workflow; polling has begun.
    Started(String),
    /// The start call failed; the message is also stored as the error.
    Failed(String),
    /// A reset or newer start happened while the call was in flight; its
    /// response was discarded.
    Superseded,
}

/// Drives one workflow at a time through its lifecycle.
///
/// Created with [`WorkflowController::new`]; the returned `Arc` can be
/// cloned into the view router and any other consumer.
pub struct WorkflowController {
    service: Arc<dyn WorkflowService>,
    store: StateStore,
    config: ControllerConfig,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
    /// The poll task of the current workflow, if any.
    poll: Mutex<Option<PollTask>>,
    health: Mutex<Option<JoinHandle<()>>>,
    /// Bumped by every start and reset; a start whose epoch is stale when
    /// its call resolves is discarded.
    epoch: AtomicU64,
}

/// Bookkeeping for a running poll task.
struct PollTask {
    workflow_id: String,
    /// Child of the master token.
    cancel: CancellationToken,
    /// Cancelled by the task itself when it exits.
    finished: CancellationToken,
    handle: JoinHandle<()>,
}

impl WorkflowController {
    pub fn new(service: Arc<dyn WorkflowService>, config: ControllerConfig) -> Arc<Self> {
        Arc::new(Self {
            service,
            store: StateStore::new(),
            config,
            cancel: CancellationToken::new(),
            poll: Mutex::new(None),
            health: Mutex::new(None),
            epoch: AtomicU64::new(0),
        })
    }

    /// Read access to the controller state.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Start a new workflow.
    ///
    /// Aborts polling of any previous workflow, stores `config`, and calls
    /// the orchestrator. On success the initial `initializing` status is
    /// recorded before the first poll and the poll task is spawned. On
    /// failure the error is recorded and nothing is polled.
    pub async fn start(&self, config: WorkflowConfig) -> StartOutcome {
        let epoch = {
            let mut poll = self.poll.lock().await;
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = poll.take() {
                tracing::info!(workflow_id = %previous.workflow_id, "Abandoning previous workflow");
                previous.cancel.cancel();
            }
            self.store.begin_start(config.clone());
            epoch
        };

        tracing::info!(
            url = %config.url,
            workflow_type = %config.workflow_type.as_str(),
            "Starting workflow",
        );

        let result = self.service.start_workflow(&config).await;

        let mut poll = self.poll.lock().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Start response arrived after reset, discarded");
            return StartOutcome::Superseded;
        }

        match result {
            Ok(response) => {
                let workflow_id = response.workflow_id;
                self.store.start_succeeded(&workflow_id, Utc::now());
                *poll = Some(self.spawn_poll(workflow_id.clone()));
                tracing::info!(workflow_id = %workflow_id, "Workflow started");
                StartOutcome::Started(workflow_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start workflow");
                let message = format!("Failed to start workflow: {e}");
                self.store.start_failed(message.clone());
                StartOutcome::Failed(message)
            }
        }
    }

    /// Fetch and store the results of `workflow_id`.
    ///
    /// Failure records the error and leaves the status untouched. Returns
    /// whether results were stored.
    pub async fn fetch_results(&self, workflow_id: &str) -> bool {
        poller::fetch_results(self.service.as_ref(), &self.store, workflow_id).await
    }

    /// Refresh the service-health snapshot once.
    ///
    /// Failures are logged only; `error` and `loading` are never touched.
    pub async fn refresh_health(&self) -> bool {
        health::refresh_once(self.service.as_ref(), &self.store).await
    }

    /// Spawn the periodic health refresh. Does nothing if already running.
    pub async fn spawn_health_loop(&self) {
        let mut health = self.health.lock().await;
        if health.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let handle = tokio::spawn(health::run(
            Arc::clone(&self.service),
            self.store.clone(),
            self.config.health_interval,
            self.cancel.child_token(),
        ));
        *health = Some(handle);
    }

    /// Ask the orchestrator to cancel the current workflow.
    ///
    /// The poll task observes the `cancelled` status on its next iteration
    /// and stops. Returns whether the request was accepted.
    pub async fn cancel(&self) -> bool {
        let current = self.store.with(|state| {
            state
                .current_workflow
                .as_ref()
                .map(|wf| (wf.workflow_id.clone(), wf.status))
        });
        let Some((workflow_id, state)) = current else {
            tracing::debug!("No workflow to cancel");
            return false;
        };
        if state.is_terminal() {
            tracing::debug!(workflow_id = %workflow_id, %state, "Workflow already finished");
            return false;
        }

        match self.service.cancel_workflow(&workflow_id).await {
            Ok(response) => {
                tracing::info!(
                    workflow_id = %workflow_id,
                    message = %response.message,
                    "Workflow cancellation requested",
                );
                true
            }
            Err(e) => {
                tracing::warn!(workflow_id = %workflow_id, error = %e, "Failed to cancel workflow");
                self.store.record_workflow_error(
                    &workflow_id,
                    format!("Failed to cancel workflow: {e}"),
                );
                false
            }
        }
    }

    /// Return to the empty state.
    ///
    /// Stops polling and clears config, status, results and error. Service
    /// health is kept. Responses still in flight are discarded when they
    /// resolve.
    pub async fn reset(&self) {
        let mut poll = self.poll.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = poll.take() {
            tracing::debug!(workflow_id = %task.workflow_id, "Stopping poll task");
            task.cancel.cancel();
        }
        self.store.reset();
        tracing::info!("Workflow state reset");
    }

    /// Clear the error banner. Nothing else changes.
    pub fn dismiss_error(&self) {
        self.store.clear_error();
    }

    /// Resolve once the current poll task (if any) has exited.
    ///
    /// Polling ends on a terminal status (after the results fetch), on an
    /// unrecoverable poll error, or on reset.
    pub async fn wait_for_polling(&self) {
        let finished = self
            .poll
            .lock()
            .await
            .as_ref()
            .map(|task| task.finished.clone());
        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }

    /// Stop all background tasks.
    ///
    /// Cancels the master token, then waits up to 5 seconds per task for a
    /// clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down workflow controller");
        self.cancel.cancel();

        if let Some(task) = self.poll.lock().await.take() {
            task.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, task.handle).await.is_err() {
                tracing::warn!(workflow_id = %task.workflow_id, "Poll task did not stop in time");
            }
        }

        if let Some(handle) = self.health.lock().await.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Health task did not stop in time");
            }
        }

        tracing::info!("Workflow controller shut down complete");
    }

    /// Token cancelled when the controller shuts down.
    pub(crate) fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    // ---- private helpers ----

    fn spawn_poll(&self, workflow_id: String) -> PollTask {
        let cancel = self.cancel.child_token();
        let finished = CancellationToken::new();

        let ctx = PollContext {
            service: Arc::clone(&self.service),
            store: self.store.clone(),
            workflow_id: workflow_id.clone(),
            interval: self.config.poll_interval.max(MIN_INTERVAL),
            retry: self.config.poll_retry.clone(),
        };
        let task_cancel = cancel.clone();
        let done = finished.clone();
        let handle = tokio::spawn(async move {
            let _done = done.drop_guard();
            poller::run_poll_loop(ctx, task_cancel).await;
        });

        PollTask {
            workflow_id,
            cancel,
            finished,
            handle,
        }
    }
}
