//! # Task record and read-only snapshots.
//!
//! [`Task`] is the unit-of-work record owned by the scheduler's task store.
//! It is mutated only by the worker holding it (while RUNNING) or by the
//! submit/cancel/requeue paths (while not RUNNING); every status change goes
//! through [`TaskStatus::can_transition_to`].
//!
//! External readers only ever see [`TaskSnapshot`] clones.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policies::{BackoffPolicy, JitterPolicy};
use crate::tasks::handler::HandlerRef;
use crate::tasks::options::SubmitOptions;
use crate::tasks::payload::Payload;
use crate::tasks::priority::Priority;
use crate::tasks::status::TaskStatus;

/// Process-wide id counter; ids are never reused.
static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        TaskId(TASK_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of a task at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub task_type: String,
    pub payload: Payload,
    pub status: TaskStatus,
    pub priority: Priority,
    pub retry_count: u32,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Number of attempts started so far.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when `Completed`.
    pub result: Option<Value>,
    /// Present only when `Retrying` or `Failed`.
    pub error: Option<String>,
    /// Present only when `Retrying` or `Failed`.
    pub trace: Option<String>,
}

/// What happens to a task after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FailureOutcome {
    /// Status is `Retrying`; re-queue after `delay`.
    Retry { retry_count: u32, delay: Duration },
    /// Status is `Failed`.
    Dead,
}

/// Mutable task record.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) task_type: Arc<str>,
    pub(crate) payload: Payload,
    pub(crate) handler: HandlerRef,
    pub(crate) options: SubmitOptions,
    pub(crate) status: TaskStatus,
    pub(crate) retry_count: u32,
    pub(crate) attempts: u32,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) result: Option<Value>,
    pub(crate) error: Option<String>,
    pub(crate) trace: Option<String>,
}

impl Task {
    /// New `Pending` task with a fresh id.
    pub(crate) fn new(
        task_type: Arc<str>,
        payload: Payload,
        handler: HandlerRef,
        options: SubmitOptions,
    ) -> Self {
        Self {
            id: TaskId::next(),
            task_type,
            payload,
            handler,
            options,
            status: TaskStatus::Pending,
            retry_count: 0,
            attempts: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            trace: None,
        }
    }

    /// Moves to `next` if the state machine allows it.
    fn transition(&mut self, next: TaskStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    /// `Pending → Running`; returns the 1-based attempt number.
    pub(crate) fn start(&mut self) -> Option<u32> {
        if !self.transition(TaskStatus::Running) {
            return None;
        }
        self.attempts += 1;
        self.started_at = Some(Utc::now());
        Some(self.attempts)
    }

    /// `Running → Completed`.
    pub(crate) fn complete(&mut self, value: Value) -> bool {
        if !self.transition(TaskStatus::Completed) {
            return false;
        }
        self.completed_at = Some(Utc::now());
        self.result = Some(value);
        true
    }

    /// `Running → Retrying | Failed`.
    ///
    /// Non-retryable failures go straight to `Failed` without consuming budget.
    /// Otherwise the retry counter is bumped while under `max_retries`, and the
    /// delay is `retry_delay × 2^(retry_count before bump)`, capped at `max_delay`.
    pub(crate) fn fail(
        &mut self,
        error: String,
        trace: String,
        retryable: bool,
        max_delay: Duration,
        jitter: JitterPolicy,
    ) -> Option<FailureOutcome> {
        if self.status != TaskStatus::Running {
            return None;
        }
        self.error = Some(error);
        self.trace = Some(trace);

        if retryable && self.retry_count < self.options.max_retries {
            let max = max_delay.max(self.options.retry_delay);
            let delay = BackoffPolicy::exponential(self.options.retry_delay, max, jitter)
                .next(self.retry_count);
            self.retry_count += 1;
            self.transition(TaskStatus::Retrying);
            return Some(FailureOutcome::Retry {
                retry_count: self.retry_count,
                delay,
            });
        }

        self.transition(TaskStatus::Failed);
        self.completed_at = Some(Utc::now());
        Some(FailureOutcome::Dead)
    }

    /// `Retrying → Pending`.
    pub(crate) fn requeue(&mut self) -> bool {
        if !self.transition(TaskStatus::Pending) {
            return false;
        }
        self.error = None;
        self.trace = None;
        true
    }

    /// `Pending → Cancelled`.
    pub(crate) fn cancel(&mut self) -> bool {
        if !self.transition(TaskStatus::Cancelled) {
            return false;
        }
        self.completed_at = Some(Utc::now());
        true
    }

    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            task_type: self.task_type.to_string(),
            payload: self.payload.clone(),
            status: self.status,
            priority: self.options.priority,
            retry_count: self.retry_count,
            max_retries: self.options.max_retries,
            retry_delay: self.options.retry_delay,
            attempts: self.attempts,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            result: self.result.clone(),
            error: self.error.clone(),
            trace: self.trace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::handler_fn::HandlerFn;
    use crate::tasks::handler::TaskContext;
    use serde_json::json;

    fn task(max_retries: u32) -> Task {
        let handler: HandlerRef =
            HandlerFn::arc(|_ctx: TaskContext| async { Ok::<_, TaskError>(Value::Null) });
        Task::new(
            Arc::from("noop"),
            Payload::new(),
            handler,
            SubmitOptions::default()
                .with_max_retries(max_retries)
                .with_retry_delay(Duration::from_secs(1)),
        )
    }

    fn fail(t: &mut Task) -> Option<FailureOutcome> {
        t.fail(
            "boom".into(),
            "trace".into(),
            true,
            Duration::from_secs(3600),
            JitterPolicy::None,
        )
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
    }

    #[test]
    fn budget_allows_max_retries_plus_one_attempts() {
        let mut t = task(2);

        assert_eq!(t.start(), Some(1));
        assert_eq!(
            fail(&mut t),
            Some(FailureOutcome::Retry {
                retry_count: 1,
                delay: Duration::from_secs(1)
            })
        );
        assert_eq!(t.status, TaskStatus::Retrying);
        assert!(t.requeue());
        assert!(t.error.is_none());

        assert_eq!(t.start(), Some(2));
        assert_eq!(
            fail(&mut t),
            Some(FailureOutcome::Retry {
                retry_count: 2,
                delay: Duration::from_secs(2)
            })
        );
        assert!(t.requeue());

        assert_eq!(t.start(), Some(3));
        assert_eq!(fail(&mut t), Some(FailureOutcome::Dead));
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.retry_count, 2);
        assert_eq!(t.error.as_deref(), Some("boom"));
    }

    #[test]
    fn non_retryable_fails_without_consuming_budget() {
        let mut t = task(3);
        t.start();
        let outcome = t.fail(
            "bad".into(),
            "trace".into(),
            false,
            Duration::from_secs(60),
            JitterPolicy::None,
        );
        assert_eq!(outcome, Some(FailureOutcome::Dead));
        assert_eq!(t.retry_count, 0);
    }

    #[test]
    fn cancel_only_while_pending() {
        let mut t = task(0);
        t.start();
        assert!(!t.cancel());
        assert!(t.complete(json!("ok")));
        assert!(!t.cancel());
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.snapshot().result, Some(json!("ok")));

        let mut p = task(0);
        assert!(p.cancel());
        assert_eq!(p.start(), None);
    }

    #[test]
    fn spread_jitter_keeps_retry_delay_within_half_either_side() {
        for _ in 0..50 {
            let mut t = task(2);
            let mut delays = Vec::new();
            for _ in 0..2 {
                t.start();
                let outcome = t.fail(
                    "boom".into(),
                    "trace".into(),
                    true,
                    Duration::from_secs(3600),
                    JitterPolicy::Spread,
                );
                match outcome {
                    Some(FailureOutcome::Retry { delay, .. }) => delays.push(delay),
                    other => panic!("expected a retry, got {other:?}"),
                }
                assert!(t.requeue());
            }

            // 1s before the first retry, 2s before the second.
            let (first, second) = (delays[0], delays[1]);
            assert!(first >= Duration::from_millis(500), "{first:?} below 0.5x");
            assert!(first < Duration::from_millis(1500), "{first:?} not below 1.5x");
            assert!(second >= Duration::from_secs(1), "{second:?} below 0.5x");
            assert!(second < Duration::from_secs(3), "{second:?} not below 1.5x");
        }
    }
}
