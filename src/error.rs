//! Error types used by the taskpool runtime, its handlers and the retry wrapper.
//!
//! - [`TaskError`] - failures returned by task handlers (and by operations wrapped in [`Retry`](crate::Retry)).
//! - [`SubmitError`] - submission rejected (unknown task type, pool shutting down).
//! - [`RegistryError`] - handler registration rejected.
//! - [`RuntimeError`] - failures of the pool itself, such as a shutdown exceeding its grace period.
//!
//! All enums provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::retry::{Classify, FailureKind};
use crate::tasks::TaskId;

/// # Errors produced by the pool runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some handlers were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Tasks still RUNNING when the grace period ran out.
        stuck: Vec<TaskId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by task handlers.
///
/// `Fail`, `Network` and `Timeout` are retryable. `Fatal` is the explicit
/// non-retryable marker: the queue marks the task FAILED at once and the
/// [`Retry`](crate::Retry) wrapper returns it without another attempt.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Attempt exceeded its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (never retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Network-class failure (connection refused/reset, upstream unavailable).
    #[error("network error: {error}")]
    Network {
        /// The underlying error message.
        error: String,
    },

    /// Execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler observed cancellation and gave up.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Network`].
    pub fn network(error: impl Into<String>) -> Self {
        TaskError::Network {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Network { .. } => "task_network",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the error is safe to retry.
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaskError::Fail { .. } | TaskError::Network { .. } | TaskError::Timeout { .. }
        )
    }
}

impl Classify for TaskError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            TaskError::Timeout { .. } => FailureKind::Timeout,
            TaskError::Network { .. } => FailureKind::Network,
            TaskError::Fail { .. } => FailureKind::Retryable,
            TaskError::Fatal { .. } => FailureKind::NonRetryable,
            TaskError::Canceled => FailureKind::Other,
        }
    }
}

/// # Submission rejected by the scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No handler is registered under the requested task type.
    #[error("no handler registered for task type {name:?}")]
    UnknownTaskType {
        /// Requested task type.
        name: String,
    },

    /// The scheduler is shutting down and no longer accepts work.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::UnknownTaskType { .. } => "submit_unknown_task_type",
            SubmitError::ShuttingDown => "submit_shutting_down",
        }
    }
}

/// # Handler registration rejected.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A handler is already registered under this name.
    #[error("handler {name:?} is already registered")]
    Duplicate {
        /// Conflicting task type.
        name: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::Duplicate { .. } => "registry_duplicate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_is_non_retryable_kind() {
        assert_eq!(
            TaskError::fatal("bad input").failure_kind(),
            FailureKind::NonRetryable
        );
        assert!(!TaskError::Canceled.is_retryable());
    }

    #[test]
    fn network_and_timeout_are_retryable() {
        assert!(TaskError::network("connection reset").is_retryable());
        assert!(
            TaskError::Timeout {
                timeout: Duration::from_secs(3)
            }
            .is_retryable()
        );
        assert_eq!(
            TaskError::network("x").failure_kind(),
            FailureKind::Network
        );
    }

    #[test]
    fn submit_error_mentions_task_type() {
        let err = SubmitError::UnknownTaskType {
            name: "send_email".into(),
        };
        assert!(err.to_string().contains("send_email"));
        assert_eq!(err.as_label(), "submit_unknown_task_type");
    }
}
