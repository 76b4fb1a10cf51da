//! # Backoff policy for retrying work.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated failures.
//! The delay for attempt `n` (0-indexed) is `first × factor^n`, clamped to `max`,
//! then jitter is applied. The base is derived purely from the attempt number, so
//! jitter output never feeds back into later delays.
//!
//! [`backoff`] is the fixed-factor form `min(base × 2^attempt, max)` used by the
//! queue and by [`RetryContext`](crate::RetryContext).
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{BackoffPolicy, JitterPolicy};
//!
//! let policy = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(60),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(policy.next(0), Duration::from_secs(1));
//! assert_eq!(policy.next(3), Duration::from_secs(8));
//! assert_eq!(policy.next(10), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap (applied before jitter).
    pub max: Duration,
    /// Multiplicative growth factor.
    pub factor: f64,
    /// Jitter applied to the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 60s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Exponential (factor 2) policy starting at `first`.
    pub fn exponential(first: Duration, max: Duration, jitter: JitterPolicy) -> Self {
        Self {
            first,
            max,
            factor: 2.0,
            jitter,
        }
    }

    /// Constant delay: every attempt waits `delay` (still capped at `max`).
    pub fn constant(delay: Duration, max: Duration, jitter: JitterPolicy) -> Self {
        Self {
            first: delay,
            max,
            factor: 1.0,
            jitter,
        }
    }

    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// Non-finite or negative intermediate values (huge attempts, odd factors)
    /// collapse to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let raw = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !raw.is_finite() || raw < 0.0 || raw > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(raw)
        };
        self.jitter.apply(base)
    }
}

/// `min(base × 2^attempt, max)`, scaled by a uniform factor in `[0.5, 1.5)` when `jitter` is set.
///
/// ```rust
/// use std::time::Duration;
/// use taskpool::backoff;
///
/// let s = Duration::from_secs;
/// assert_eq!(backoff(0, s(1), s(60), false), s(1));
/// assert_eq!(backoff(3, s(1), s(60), false), s(8));
/// assert_eq!(backoff(9, s(1), s(60), false), s(60));
/// ```
pub fn backoff(attempt: u32, base: Duration, max: Duration, jitter: bool) -> Duration {
    let jitter = if jitter {
        JitterPolicy::Spread
    } else {
        JitterPolicy::None
    };
    BackoffPolicy::exponential(base, max, jitter).next(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_attempt_zero_returns_base() {
        assert_eq!(backoff(0, secs(1), secs(60), false), secs(1));
    }

    #[test]
    fn test_doubles_per_attempt() {
        assert_eq!(backoff(1, secs(1), secs(60), false), secs(2));
        assert_eq!(backoff(2, secs(1), secs(60), false), secs(4));
        assert_eq!(backoff(3, secs(1), secs(60), false), secs(8));
    }

    #[test]
    fn test_clamped_to_max() {
        assert_eq!(backoff(6, secs(1), secs(60), false), secs(60));
        assert_eq!(backoff(u32::MAX, secs(1), secs(60), false), secs(60));
    }

    #[test]
    fn test_base_exceeds_max() {
        assert_eq!(backoff(0, secs(90), secs(60), false), secs(60));
    }

    #[test]
    fn test_jitter_within_half_and_one_and_a_half() {
        let expected = secs(8);
        for _ in 0..200 {
            let d = backoff(3, secs(1), secs(60), true);
            assert!(d >= expected / 2, "{d:?} below 0.5x");
            assert!(d < expected * 3 / 2, "{d:?} not below 1.5x");
        }
    }

    #[test]
    fn test_constant_policy() {
        let policy = BackoffPolicy::constant(
            Duration::from_millis(500),
            secs(30),
            JitterPolicy::None,
        );
        for attempt in 0..10 {
            assert_eq!(policy.next(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_sub_second_growth() {
        let policy = BackoffPolicy::exponential(
            Duration::from_millis(100),
            secs(30),
            JitterPolicy::None,
        );
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(4), Duration::from_millis(1600));
    }
}
