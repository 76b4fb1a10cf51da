//! # State of one logical retry loop.
//!
//! [`RetryContext`] is created per call site, advanced before every attempt and
//! discarded once the loop exits (success, non-retryable failure, attempts
//! exhausted, or overall timeout exceeded).

use std::time::Duration;

use tokio::time::Instant;

use crate::policies::{BackoffPolicy, JitterPolicy};
use crate::retry::classify::{Classify, FailureKind};

/// Attempt counter, deadline and backoff parameters of a retry loop.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use taskpool::{RetryContext, TaskError};
///
/// let mut ctx = RetryContext::new(3, Duration::from_secs(1), true, None);
///
/// ctx.advance(); // attempt 1 fails
/// assert!(ctx.should_retry(&TaskError::network("reset")));
/// assert_eq!(ctx.next_delay(), Duration::from_secs(1));
///
/// ctx.advance(); // attempt 2 fails
/// assert_eq!(ctx.next_delay(), Duration::from_secs(2));
/// assert!(!ctx.should_retry(&TaskError::fatal("bad request")));
///
/// ctx.advance(); // attempt 3 fails, budget exhausted
/// assert!(!ctx.should_retry(&TaskError::network("reset")));
/// ```
#[derive(Clone, Debug)]
pub struct RetryContext {
    max_attempts: u32,
    policy: BackoffPolicy,
    timeout: Option<Duration>,
    retry_on: Vec<FailureKind>,
    attempt: u32,
    started: Option<Instant>,
}

impl RetryContext {
    /// Creates a context allowing `max_attempts` calls in total.
    ///
    /// With `backoff_enabled` the delay doubles per attempt starting at `delay`
    /// (capped at 60s unless changed with [`with_max_delay`](Self::with_max_delay));
    /// otherwise every retry waits `delay`.
    pub fn new(
        max_attempts: u32,
        delay: Duration,
        backoff_enabled: bool,
        timeout: Option<Duration>,
    ) -> Self {
        let max = BackoffPolicy::default().max.max(delay);
        let policy = if backoff_enabled {
            BackoffPolicy::exponential(delay, max, JitterPolicy::None)
        } else {
            BackoffPolicy::constant(delay, max, JitterPolicy::None)
        };
        Self {
            max_attempts: max_attempts.max(1),
            policy,
            timeout,
            retry_on: FailureKind::DEFAULT_RETRYABLE.to_vec(),
            attempt: 0,
            started: None,
        }
    }

    /// Caps the computed delay.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.policy.max = max;
        self
    }

    /// Sets the jitter applied to each delay.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Replaces the allow-list of retryable failure kinds.
    pub fn with_retry_on(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// Records the start of a new attempt; starts the clock on the first call.
    pub fn advance(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Decides whether the failure `err` of the current attempt deserves another attempt.
    ///
    /// Returns `false` when:
    /// - the error is marked [`FailureKind::NonRetryable`];
    /// - `max_attempts` calls were already made;
    /// - an overall timeout is configured and has elapsed;
    /// - the error kind is not in the allow-list.
    pub fn should_retry<E: Classify + ?Sized>(&self, err: &E) -> bool {
        let kind = err.failure_kind();
        if kind == FailureKind::NonRetryable {
            return false;
        }
        if self.is_exhausted() || self.is_expired() {
            return false;
        }
        self.retry_on.contains(&kind)
    }

    /// Delay to wait before the next attempt.
    ///
    /// The first retry waits the base delay; each further retry doubles it
    /// when backoff is enabled.
    pub fn next_delay(&self) -> Duration {
        self.policy.next(self.attempt.saturating_sub(1))
    }

    /// Number of attempts started so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Configured maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True once `max_attempts` attempts have been started.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Time since the first attempt started (zero before that).
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn is_expired(&self) -> bool {
        match (self.timeout, self.started) {
            (Some(limit), Some(started)) => started.elapsed() >= limit,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskError;

    #[test]
    fn non_retryable_is_rejected_even_with_budget() {
        let mut ctx = RetryContext::new(5, Duration::from_millis(10), true, None);
        ctx.advance();
        assert!(!ctx.should_retry(&TaskError::fatal("invalid credentials")));
    }

    #[test]
    fn kinds_outside_allow_list_are_rejected() {
        let mut ctx = RetryContext::new(5, Duration::from_millis(10), true, None)
            .with_retry_on([FailureKind::Network]);
        ctx.advance();
        assert!(ctx.should_retry(&TaskError::network("refused")));
        assert!(!ctx.should_retry(&TaskError::fail("generic")));
        assert!(!ctx.should_retry(&TaskError::Canceled));
    }

    #[test]
    fn constant_delay_without_backoff() {
        let mut ctx = RetryContext::new(4, Duration::from_millis(250), false, None);
        for _ in 0..3 {
            ctx.advance();
            assert_eq!(ctx.next_delay(), Duration::from_millis(250));
        }
    }

    #[test]
    fn delay_capped_by_max_delay() {
        let mut ctx = RetryContext::new(10, Duration::from_secs(1), true, None)
            .with_max_delay(Duration::from_secs(3));
        for _ in 0..5 {
            ctx.advance();
        }
        assert_eq!(ctx.next_delay(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_stops_retries() {
        let mut ctx = RetryContext::new(
            10,
            Duration::from_millis(10),
            true,
            Some(Duration::from_secs(1)),
        );
        ctx.advance();
        assert!(ctx.should_retry(&TaskError::fail("x")));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!ctx.should_retry(&TaskError::fail("x")));
        assert!(ctx.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let mut ctx = RetryContext::new(0, Duration::ZERO, false, None);
        assert_eq!(ctx.max_attempts(), 1);
        ctx.advance();
        assert!(ctx.is_exhausted());
    }
}
