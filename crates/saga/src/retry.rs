//! Retry budget for transient create failures.

use std::time::Duration;

/// Exponential-backoff retry budget, scoped to one saga creation.
///
/// The attempt counter lives in the retry loop that consults this
/// policy, never in shared state, so concurrent sagas cannot bleed
/// attempts into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Multiplier applied to the delay after every failed retry.
    pub backoff_rate: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_rate: 2,
        }
    }
}

impl RetryPolicy {
    /// Returns the backoff delay after the given failed attempt
    /// (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * self.backoff_rate.saturating_pow(attempt.saturating_sub(1))
    }

    /// Returns true while another attempt is allowed after `attempt`
    /// attempts have been made.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
