//! # Worker: one slot of the bounded pool.
//!
//! Each worker loops: take the best pending task, run one attempt, record the
//! outcome. A worker holds at most one task at a time, so the pool never runs
//! more than `Config::workers` handlers concurrently.
//!
//! ## Event flow
//! ```text
//! take() ──► TaskStarting ──► run_once()
//!                                 ├─► Ok     → TaskCompleted
//!                                 └─► Err    → TaskFailed
//!                                               ├─► budget left → BackoffScheduled
//!                                               │                  └─► [timer] → TaskRequeued
//!                                               └─► exhausted   → TaskDead
//! ```
//!
//! ## Rules
//! - Backoff never occupies a worker: a detached timer re-queues the task.
//! - Cancellation is observed between tasks and while idle; a running handler
//!   is told through its child token and allowed to finish.
//! - Timers stop when the runtime token is cancelled; such tasks stay `Retrying`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    core::{runner::run_once, store::Lease, store::TaskStore},
    events::{Bus, Event, EventKind},
    tasks::{FailureOutcome, TaskId},
};

pub(crate) struct Worker {
    pub(crate) index: usize,
    pub(crate) cfg: Arc<Config>,
    pub(crate) store: Arc<TaskStore>,
    pub(crate) bus: Bus,
    pub(crate) active: Arc<AtomicUsize>,
}

impl Worker {
    /// Runs until `token` is cancelled.
    pub(crate) async fn run(self, token: CancellationToken) {
        let poll = self.cfg.poll_interval_clamped();
        self.bus
            .publish(Event::new(EventKind::WorkerStarted).with_worker(self.index));
        debug!(worker = self.index, "worker started");

        loop {
            if token.is_cancelled() {
                break;
            }
            let lease = select! {
                biased;
                _ = token.cancelled() => break,
                lease = self.store.take(poll) => lease,
            };
            let Some(lease) = lease else { continue };

            self.active.fetch_add(1, Ordering::SeqCst);
            self.execute(lease, &token).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }

        self.bus
            .publish(Event::new(EventKind::WorkerStopped).with_worker(self.index));
        debug!(worker = self.index, "worker stopped");
    }

    async fn execute(&self, lease: Lease, token: &CancellationToken) {
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(lease.id)
                .with_task_type(lease.task_type.clone())
                .with_priority(lease.priority)
                .with_attempt(lease.attempt)
                .with_worker(self.index),
        );
        debug!(
            task_id = %lease.id,
            task_type = %lease.task_type,
            attempt = lease.attempt,
            worker = self.index,
            "task starting"
        );

        let failure = match run_once(&lease, token, &self.bus).await {
            Ok(value) => {
                if self.store.complete(lease.id, value).await {
                    self.bus.publish(
                        Event::new(EventKind::TaskCompleted)
                            .with_task(lease.id)
                            .with_task_type(lease.task_type.clone())
                            .with_attempt(lease.attempt)
                            .with_worker(self.index),
                    );
                    info!(
                        task_id = %lease.id,
                        task_type = %lease.task_type,
                        attempt = lease.attempt,
                        "task completed"
                    );
                }
                return;
            }
            Err(failure) => failure,
        };

        self.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(lease.id)
                .with_task_type(lease.task_type.clone())
                .with_attempt(lease.attempt)
                .with_worker(self.index)
                .with_reason(failure.message.as_str()),
        );

        let outcome = self
            .store
            .fail(
                lease.id,
                failure.message.clone(),
                failure.trace,
                failure.retryable,
                self.cfg.max_retry_delay,
                self.cfg.retry_jitter,
            )
            .await;

        match outcome {
            Some(FailureOutcome::Retry { retry_count, delay }) => {
                self.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_task(lease.id)
                        .with_task_type(lease.task_type.clone())
                        .with_attempt(lease.attempt)
                        .with_delay(delay)
                        .with_reason(failure.message.as_str()),
                );
                warn!(
                    task_id = %lease.id,
                    task_type = %lease.task_type,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure.message,
                    "task failed, retry scheduled"
                );
                self.schedule_requeue(lease.id, delay, token.clone());
            }
            Some(FailureOutcome::Dead) => {
                self.bus.publish(
                    Event::new(EventKind::TaskDead)
                        .with_task(lease.id)
                        .with_task_type(lease.task_type.clone())
                        .with_attempt(lease.attempt)
                        .with_reason(failure.message.as_str()),
                );
                warn!(
                    task_id = %lease.id,
                    task_type = %lease.task_type,
                    attempts = lease.attempt,
                    error = %failure.message,
                    "task failed permanently"
                );
            }
            None => {}
        }
    }

    /// Re-queues `id` after `delay` unless the runtime shuts down first.
    fn schedule_requeue(&self, id: TaskId, delay: Duration, token: CancellationToken) {
        let store = Arc::clone(&self.store);
        let bus = self.bus.clone();
        tokio::spawn(async move {
            select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
            if let Some(priority) = store.requeue(id).await {
                bus.publish(
                    Event::new(EventKind::TaskRequeued)
                        .with_task(id)
                        .with_priority(priority),
                );
                debug!(task_id = %id, "task re-queued after backoff");
            }
        });
    }
}
