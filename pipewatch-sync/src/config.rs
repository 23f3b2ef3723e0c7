//! Sync configuration
//!
//! Poll period and the retry budget for failed poll ticks.

use std::time::Duration;

use crate::error::SyncError;

/// How failed poll ticks are retried
///
/// After `n` consecutive failures the next tick waits
/// `min(poll_interval * 2^(n-1), backoff_cap)`. A successful tick resets
/// the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures after which polling is suspended (0 = never)
    pub max_consecutive_failures: u32,

    /// Upper bound on the delay between failed ticks
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    /// Retry forever at the poll period
    pub fn unbounded() -> Self {
        Self {
            max_consecutive_failures: 0,
            backoff_cap: Duration::ZERO,
        }
    }

    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures != 0 && failures >= self.max_consecutive_failures
    }

    /// Delay before the tick following the `failures`-th consecutive failure
    pub fn delay_after(&self, period: Duration, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        let delay = period.saturating_mul(1u32 << exponent);
        delay.min(self.backoff_cap).max(period)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 10,
            backoff_cap: Duration::from_secs(8),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Period between poll ticks while a run is active
    pub poll_interval: Duration,

    /// Retry budget for failed ticks
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Creates configuration from environment variables
    ///
    /// Optional environment variables:
    /// - PIPEWATCH_POLL_INTERVAL_MS (default: 1000)
    /// - PIPEWATCH_MAX_POLL_FAILURES (default: 10, 0 retries forever)
    /// - PIPEWATCH_POLL_BACKOFF_CAP_MS (default: 8000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = env_u64("PIPEWATCH_POLL_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let max_consecutive_failures = std::env::var("PIPEWATCH_MAX_POLL_FAILURES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.retry.max_consecutive_failures);

        let backoff_cap = env_u64("PIPEWATCH_POLL_BACKOFF_CAP_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.backoff_cap);

        Self {
            poll_interval,
            retry: RetryPolicy {
                max_consecutive_failures,
                backoff_cap,
            },
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.poll_interval.is_zero() {
            return Err(SyncError::InvalidConfig(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_consecutive_failures != 0 && self.retry.backoff_cap < self.poll_interval
        {
            return Err(SyncError::InvalidConfig(
                "backoff_cap must not be shorter than poll_interval".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}
