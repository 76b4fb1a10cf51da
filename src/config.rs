//! # Pool configuration.
//!
//! [`Config`] holds the settings of one [`Scheduler`](crate::Scheduler):
//! worker count, dequeue poll interval, shutdown grace, event bus capacity,
//! queue retry backoff cap/jitter and the default per-attempt timeout.
//!
//! ## Sentinel values
//! - `workers = 0` → clamped to a single worker
//! - `timeout = 0s` → no per-attempt timeout
//! - `grace = 0s` → shutdown does not wait for running handlers
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use taskpool::{Config, JitterPolicy};
//!
//! let mut cfg = Config::default();
//! cfg.workers = 8;
//! cfg.retry_jitter = JitterPolicy::Spread;
//! cfg.timeout = Duration::from_secs(30);
//!
//! assert_eq!(cfg.worker_count(), 8);
//! assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(30)));
//! ```

use std::time::Duration;

use crate::policies::JitterPolicy;

/// Configuration of the scheduler and its worker pool.
///
/// All fields are public; prefer the helper accessors over sprinkling
/// sentinel checks (`0`) across call sites.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker loops pulling from the queue.
    pub workers: usize,

    /// Upper bound of a single dequeue wait.
    ///
    /// An idle worker wakes up at least this often to observe shutdown.
    pub poll_interval: Duration,

    /// Maximum time to wait for running handlers during shutdown.
    pub grace: Duration,

    /// Capacity of the event bus broadcast ring buffer.
    pub bus_capacity: usize,

    /// Cap on the delay between queue retries.
    pub max_retry_delay: Duration,

    /// Jitter applied to queue retry delays.
    pub retry_jitter: JitterPolicy,

    /// Default per-attempt handler timeout (`0s` = none).
    ///
    /// Overridden per task by [`SubmitOptions::timeout`](crate::SubmitOptions::timeout).
    pub timeout: Duration,
}

impl Config {
    /// Number of workers to spawn (never zero).
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Returns the default per-attempt timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the poll interval, never shorter than one millisecond.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(Duration::from_millis(1))
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers = 4`
    /// - `poll_interval = 1s`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `max_retry_delay = 1h`
    /// - `retry_jitter = JitterPolicy::None`
    /// - `timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            workers: 4,
            poll_interval: Duration::from_secs(1),
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            max_retry_delay: Duration::from_secs(3600),
            retry_jitter: JitterPolicy::None,
            timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_normalized() {
        let cfg = Config {
            workers: 0,
            bus_capacity: 0,
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.worker_count(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.poll_interval_clamped(), Duration::from_millis(1));
    }
}
