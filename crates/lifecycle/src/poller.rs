//! Status polling task.
//!
//! One task per workflow. It polls immediately, then every poll interval,
//! until the workflow reaches a terminal state, an unrecoverable poll error
//! occurs, or its [`CancellationToken`] is triggered (reset, new start,
//! shutdown).

use std::sync::Arc;
use std::time::Duration;

use qaflow_client::WorkflowService;
use qaflow_core::state::StatusOutcome;
use tokio_util::sync::CancellationToken;

use crate::backoff::{next_delay, PollRetryPolicy};
use crate::store::StateStore;

/// Everything a poll task needs, owned so it can move into `tokio::spawn`.
pub(crate) struct PollContext {
    pub service: Arc<dyn WorkflowService>,
    pub store: StateStore,
    pub workflow_id: String,
    pub interval: Duration,
    pub retry: PollRetryPolicy,
}

/// Poll `ctx.workflow_id` until terminal or cancelled.
pub(crate) async fn run_poll_loop(ctx: PollContext, cancel: CancellationToken) {
    let workflow_id = ctx.workflow_id.as_str();
    let mut failures = 0u32;
    let mut retry_delay = ctx.retry.initial_delay;

    tracing::info!(workflow_id, "Polling workflow status");

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(workflow_id, "Polling cancelled");
                return;
            }
            result = ctx.service.get_workflow_status(workflow_id) => result,
        };

        let delay = match result {
            Ok(status) => {
                failures = 0;
                retry_delay = ctx.retry.initial_delay;
                let state = status.status;
                let progress = status.progress;

                match ctx.store.apply_status(status) {
                    StatusOutcome::Continue => {
                        tracing::debug!(workflow_id, %state, progress, "Workflow in progress");
                        ctx.interval
                    }
                    StatusOutcome::FetchResults => {
                        tracing::info!(workflow_id, %state, "Workflow reached terminal state");
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                tracing::debug!(workflow_id, "Results fetch cancelled");
                            }
                            _ = fetch_results(ctx.service.as_ref(), &ctx.store, workflow_id) => {}
                        }
                        return;
                    }
                    StatusOutcome::Stop => {
                        tracing::info!(workflow_id, %state, "Workflow cancelled, polling stopped");
                        return;
                    }
                    StatusOutcome::Ignored => {
                        tracing::debug!(workflow_id, "Workflow no longer current, polling stopped");
                        return;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                if failures > ctx.retry.max_retries {
                    tracing::warn!(workflow_id, error = %e, "Status poll failed, polling stopped");
                    ctx.store.record_workflow_error(
                        workflow_id,
                        format!("Failed to get workflow status: {e}"),
                    );
                    return;
                }

                let delay = retry_delay;
                retry_delay = next_delay(retry_delay, &ctx.retry);
                tracing::warn!(
                    workflow_id,
                    error = %e,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "Status poll failed, retrying",
                );
                delay
            }
        };

        // Wait before the next poll, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(workflow_id, "Polling cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Fetch and store the results of a terminal workflow.
///
/// Failure records the error and leaves the stored status untouched.
/// Returns whether results were stored.
pub(crate) async fn fetch_results(
    service: &dyn WorkflowService,
    store: &StateStore,
    workflow_id: &str,
) -> bool {
    match service.get_workflow_results(workflow_id).await {
        Ok(results) => {
            let stored = store.apply_results(results);
            if stored {
                tracing::info!(workflow_id, "Workflow results stored");
            } else {
                tracing::debug!(workflow_id, "Results dropped, workflow not current, not terminal, or already stored");
            }
            stored
        }
        Err(e) => {
            tracing::warn!(workflow_id, error = %e, "Failed to fetch workflow results");
            store.record_workflow_error(
                workflow_id,
                format!("Failed to get workflow results: {e}"),
            );
            false
        }
    }
}
