//! Query Configuration

use std::time::Duration;

/// Retry policy for failed fetches
///
/// Only retryable failures (see `ApiError::is_retryable`) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Query cache configuration
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// How long a successful result is served without refetching
    pub stale_after: Duration,
    pub retry: RetryPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Per-call overrides of [`QueryConfig`]
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub stale_after: Option<Duration>,
    pub retry: Option<RetryPolicy>,
}
