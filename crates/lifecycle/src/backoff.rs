//! Exponential-backoff retry policy for status polling.
//!
//! By default a failed poll stops the loop and surfaces the error. Setting
//! [`PollRetryPolicy::max_retries`] above zero makes the poll loop retry
//! with increasing delays before giving up.

use std::time::Duration;

/// Tunable parameters for retrying failed status polls.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRetryPolicy {
    /// Consecutive failures tolerated before the loop stops. `0` disables retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for PollRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl PollRetryPolicy {
    /// Default delays with the given retry budget.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`PollRetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &PollRetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_disabled_by_default() {
        assert_eq!(PollRetryPolicy::default().max_retries, 0);
    }

    #[test]
    fn next_delay_doubles() {
        let policy = PollRetryPolicy::default();
        assert_eq!(next_delay(Duration::from_secs(1), &policy), Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let policy = PollRetryPolicy {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(next_delay(Duration::from_secs(8), &policy), Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let policy = PollRetryPolicy::with_max_retries(8);
        let mut delay = policy.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30, 30];

        for &expected_secs in &expected {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = next_delay(delay, &policy);
        }
    }
}
