//! Periodic service-health refresh.
//!
//! Runs for the lifetime of the controller on a fixed interval using
//! `tokio::time::interval`. Failures are logged and retried on the next
//! tick; they never touch the workflow error or loading flag.

use std::sync::Arc;
use std::time::Duration;

use qaflow_client::WorkflowService;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::MIN_INTERVAL;
use crate::store::StateStore;

/// Refresh the health snapshot once. Returns whether it succeeded.
pub(crate) async fn refresh_once(service: &dyn WorkflowService, store: &StateStore) -> bool {
    match service.get_service_health().await {
        Ok(health) => {
            tracing::debug!(
                healthy = health.summary.healthy_services,
                unhealthy = health.summary.unhealthy_services,
                "Service health refreshed",
            );
            store.set_service_health(health);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Service health refresh failed");
            false
        }
    }
}

/// Run the health refresh loop until `cancel` is triggered.
///
/// The first refresh happens immediately. `interval` is raised to
/// [`MIN_INTERVAL`].
pub(crate) async fn run(
    service: Arc<dyn WorkflowService>,
    store: StateStore,
    interval: Duration,
    cancel: CancellationToken,
) {
    let interval = interval.max(MIN_INTERVAL);
    tracing::info!(interval_ms = interval.as_millis() as u64, "Service health refresh started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Service health refresh stopping");
                break;
            }
            _ = ticker.tick() => {
                refresh_once(service.as_ref(), &store).await;
            }
        }
    }
}
