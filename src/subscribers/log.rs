//! # LogWriter: events rendered through `tracing`.
//!
//! Maps every runtime event to one `tracing` record under the `taskpool::events`
//! target. Failures and overflow log at `WARN`, terminal failures and grace
//! overruns at `ERROR`, the rest at `INFO`/`DEBUG`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO taskpool::events: submitted task_id=7 task_type="send_email" priority="high"
//! WARN taskpool::events: attempt failed task_id=7 attempt=1 reason="network error: reset"
//! INFO taskpool::events: backoff scheduled task_id=7 attempt=1 delay_ms=1000
//! INFO taskpool::events: completed task_id=7 attempt=3 worker=0
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Tracing-backed event writer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let id = e.task_id.map(|id| id.as_u64());
        let task_type = e.task_type.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::TaskSubmitted => info!(
                target: "taskpool::events",
                task_id = ?id, task_type = ?task_type,
                priority = ?e.priority.map(|p| p.as_label()),
                "submitted"
            ),
            EventKind::TaskStarting => debug!(
                target: "taskpool::events",
                task_id = ?id, task_type = ?task_type, attempt = ?e.attempt, worker = ?e.worker,
                "starting"
            ),
            EventKind::TaskCompleted => info!(
                target: "taskpool::events",
                task_id = ?id, attempt = ?e.attempt, worker = ?e.worker,
                "completed"
            ),
            EventKind::TaskFailed => warn!(
                target: "taskpool::events",
                task_id = ?id, attempt = ?e.attempt, reason = ?reason,
                "attempt failed"
            ),
            EventKind::TimeoutHit => warn!(
                target: "taskpool::events",
                task_id = ?id, attempt = ?e.attempt, timeout_ms = ?e.timeout_ms,
                "timeout"
            ),
            EventKind::BackoffScheduled => info!(
                target: "taskpool::events",
                task_id = ?id, attempt = ?e.attempt, delay_ms = ?e.delay_ms,
                "backoff scheduled"
            ),
            EventKind::TaskRequeued => debug!(
                target: "taskpool::events",
                task_id = ?id,
                "requeued"
            ),
            EventKind::TaskDead => error!(
                target: "taskpool::events",
                task_id = ?id, task_type = ?task_type, attempt = ?e.attempt, reason = ?reason,
                "failed permanently"
            ),
            EventKind::TaskCancelled => info!(
                target: "taskpool::events",
                task_id = ?id,
                "cancelled"
            ),
            EventKind::WorkerStarted => debug!(target: "taskpool::events", worker = ?e.worker, "worker started"),
            EventKind::WorkerStopped => debug!(target: "taskpool::events", worker = ?e.worker, "worker stopped"),
            EventKind::ShutdownRequested => info!(target: "taskpool::events", "shutdown requested"),
            EventKind::AllStoppedWithin => info!(target: "taskpool::events", "all workers stopped within grace"),
            EventKind::GraceExceeded => error!(target: "taskpool::events", "grace exceeded"),
            EventKind::SubscriberOverflow => warn!(
                target: "taskpool::events",
                reason = ?reason,
                "subscriber overflow"
            ),
            EventKind::SubscriberPanicked => error!(
                target: "taskpool::events",
                reason = ?reason,
                "subscriber panicked"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}
