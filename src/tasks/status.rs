//! # Task state machine.
//!
//! ```text
//!             ┌──────────── cancel ───────────► CANCELLED
//!             │
//! PENDING ────┴──► RUNNING ──┬──► COMPLETED
//!    ▲                       ├──► FAILED
//!    │                       └──► RETRYING ──┐
//!    └──────── backoff delay elapsed ────────┘
//! ```
//!
//! `Completed`, `Failed` and `Cancelled` are terminal.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the queue.
    Pending,
    /// Held by exactly one worker.
    Running,
    /// Handler returned a result.
    Completed,
    /// Attempt failed; waiting out its backoff before returning to `Pending`.
    Retrying,
    /// Retry budget exhausted or non-retryable failure.
    Failed,
    /// Cancelled while still pending.
    Cancelled,
}

impl TaskStatus {
    /// All states, in declaration order.
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Retrying,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    /// True for states no task ever leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Retrying)
                | (Running, Failed)
                | (Retrying, Pending)
        )
    }

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStatus::*;
    use super::*;

    #[test]
    fn terminal_states_have_no_exits() {
        for from in TaskStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for to in TaskStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn cancel_only_from_pending() {
        for from in TaskStatus::ALL {
            assert_eq!(from.can_transition_to(Cancelled), from == Pending);
        }
    }

    #[test]
    fn retry_cycle_is_allowed() {
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Pending));
        assert!(!Retrying.can_transition_to(Running));
    }
}
