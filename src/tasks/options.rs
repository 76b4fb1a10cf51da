//! # Submission options.
//!
//! [`SubmitOptions`] describes how a submitted task is scheduled and retried:
//! priority tier, retry budget, base retry delay and an optional per-attempt timeout.
//!
//! ## Rules
//! - A task is attempted at most `max_retries + 1` times.
//! - Retry `n` (1-based) waits `min(retry_delay × 2^(n-1), Config::max_retry_delay)`.
//! - `timeout = None` falls back to [`Config::default_timeout`](crate::Config::default_timeout).

use std::time::Duration;

use crate::tasks::priority::Priority;

/// Options attached to one submission.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use taskpool::{Priority, SubmitOptions};
///
/// let opts = SubmitOptions::default()
///     .with_priority(Priority::High)
///     .with_max_retries(2)
///     .with_retry_delay(Duration::from_secs(1));
///
/// assert_eq!(opts.priority, Priority::High);
/// assert_eq!(opts.max_retries, 2);
/// assert!(opts.timeout.is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Dequeue precedence.
    pub priority: Priority,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Base delay of the first retry.
    pub retry_delay: Duration,
    /// Per-attempt handler timeout.
    pub timeout: Option<Duration>,
}

impl Default for SubmitOptions {
    /// `Normal` priority, 3 retries, 60s base delay, no timeout override.
    fn default() -> Self {
        Self {
            priority: Priority::Normal,
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
            timeout: None,
        }
    }
}

impl SubmitOptions {
    /// Returns options with the given priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns options with the given retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns options with the given base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns options with a per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
