use std::str::FromStr;
use std::time::Duration;

use qaflow_core::error::CoreError;
use qaflow_lifecycle::{ControllerConfig, PollRetryPolicy};

/// Default orchestrator origin for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8006";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a locally running orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Orchestrator base URL (default: `http://localhost:8006`).
    pub api_url: String,
    /// Per-request timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Delay between status polls (default: 2 s).
    pub poll_interval: Duration,
    /// Delay between service-health refreshes (default: 30 s).
    pub health_interval: Duration,
    /// Consecutive poll failures tolerated before polling stops (default: `0`).
    pub poll_max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: qaflow_client::DEFAULT_REQUEST_TIMEOUT,
            poll_interval: qaflow_lifecycle::config::DEFAULT_POLL_INTERVAL,
            health_interval: qaflow_lifecycle::config::DEFAULT_HEALTH_INTERVAL,
            poll_max_retries: 0,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `QAFLOW_API_URL`              | `http://localhost:8006` |
    /// | `QAFLOW_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `QAFLOW_POLL_INTERVAL_SECS`   | `2`                     |
    /// | `QAFLOW_HEALTH_INTERVAL_SECS` | `30`                    |
    /// | `QAFLOW_POLL_MAX_RETRIES`     | `0`                     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let api_url = lookup("QAFLOW_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = secs(&lookup, "QAFLOW_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout);
        let poll_interval =
            secs(&lookup, "QAFLOW_POLL_INTERVAL_SECS")?.unwrap_or(defaults.poll_interval);
        let health_interval =
            secs(&lookup, "QAFLOW_HEALTH_INTERVAL_SECS")?.unwrap_or(defaults.health_interval);
        let poll_max_retries =
            parse::<u32>(&lookup, "QAFLOW_POLL_MAX_RETRIES")?.unwrap_or(defaults.poll_max_retries);

        Ok(Self {
            api_url,
            request_timeout,
            poll_interval,
            health_interval,
            poll_max_retries,
        })
    }

    /// Timing parameters for the workflow controller.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: self.poll_interval,
            health_interval: self.health_interval,
            poll_retry: PollRetryPolicy::with_max_retries(self.poll_max_retries),
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, CoreError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))),
    }
}

/// A positive number of seconds.
fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, CoreError> {
    match parse::<u64>(lookup, key)? {
        Some(0) => Err(CoreError::Config(format!("{key} must be greater than zero"))),
        other => Ok(other.map(Duration::from_secs)),
    }
}
