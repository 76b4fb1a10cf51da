//! # Runtime events emitted by the scheduler and its workers.
//!
//! [`EventKind`] classifies events into:
//! - **Task lifecycle**: submitted, starting, completed, failed, timeout, backoff, requeued, dead, cancelled
//! - **Pool lifecycle**: worker started/stopped, shutdown requested, grace outcome
//! - **Subscriber health**: overflow and panic
//!
//! [`Event`] carries a timestamp and the optional metadata relevant to its kind.
//!
//! ## Ordering guarantees
//! Each event has a process-wide `seq` that increases monotonically; use it to
//! restore order when events from different workers interleave.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_task_type("send_email")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(2))
//!     .with_reason("network error: connection reset");
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay_ms, Some(2000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::{Priority, TaskId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle ===
    /// Task accepted and queued (`task_id`, `task_type`, `priority`).
    TaskSubmitted,
    /// Worker took the task (`task_id`, `task_type`, `attempt`, `worker`).
    TaskStarting,
    /// Handler returned a result (`task_id`, `attempt`, `worker`).
    TaskCompleted,
    /// One attempt failed (`task_id`, `attempt`, `reason`).
    TaskFailed,
    /// Attempt exceeded its timeout (`task_id`, `attempt`, `timeout_ms`); followed by `TaskFailed`.
    TimeoutHit,
    /// Retry scheduled (`task_id`, `attempt`, `delay_ms`, `reason`).
    BackoffScheduled,
    /// Backoff elapsed, task is pending again (`task_id`, `priority`).
    TaskRequeued,
    /// Terminal failure (`task_id`, `attempt`, `reason`).
    TaskDead,
    /// Cancelled before it ran (`task_id`).
    TaskCancelled,

    // === Pool lifecycle ===
    /// Worker loop started (`worker`).
    WorkerStarted,
    /// Worker loop exited (`worker`).
    WorkerStopped,
    /// Shutdown requested.
    ShutdownRequested,
    /// All running handlers finished within the grace period.
    AllStoppedWithin,
    /// Grace period exceeded; some handlers were still running.
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (`reason`: subscriber and cause).
    SubscriberOverflow,
    /// Subscriber panicked while handling an event (`reason`: panic info).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task the event refers to.
    pub task_id: Option<TaskId>,
    /// Registered task type.
    pub task_type: Option<Arc<str>>,
    /// Priority tier of the task.
    pub priority: Option<Priority>,
    /// Attempt number (1-based).
    pub attempt: Option<u32>,
    /// Worker index.
    pub worker: Option<usize>,
    /// Backoff delay in milliseconds.
    pub delay_ms: Option<u64>,
    /// Attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task_id: None,
            task_type: None,
            priority: None,
            attempt: None,
            worker: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task_id = Some(id);
        self
    }

    #[inline]
    pub fn with_task_type(mut self, task_type: impl Into<Arc<str>>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    #[inline]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_worker(mut self, index: usize) -> Self {
        self.worker = Some(index);
        self
    }

    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={cause}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskSubmitted);
        let b = Event::new(EventKind::TaskSubmitted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_stored_in_millis() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.timeout_ms, Some(1500));
        assert!(ev.delay_ms.is_none());
    }
}
