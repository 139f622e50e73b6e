use std::time::Duration;

use crate::backoff::PollRetryPolicy;

/// Interval between status polls while a workflow is non-terminal.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Interval between service-health refreshes.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Floor for both intervals; shorter values, zero included, are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Timing parameters for the controller's background tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub health_interval: Duration,
    pub poll_retry: PollRetryPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            poll_retry: PollRetryPolicy::default(),
        }
    }
}
