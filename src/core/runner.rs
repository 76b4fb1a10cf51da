//! # Run a single attempt of a task.
//!
//! Executes one attempt of a leased task with an optional timeout and reports
//! the outcome as either the handler's result or an [`AttemptFailure`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   handler.call() → Ok(value)
//!
//! Failure:
//!   handler.call() → Err(TaskError) → AttemptFailure (retryable unless Fatal)
//!
//! Panic:
//!   handler panics → AttemptFailure (retryable, message from the payload)
//!
//! Timeout:
//!   timeout exceeded → cancel child → publish TimeoutHit
//!                    → wait for the handler to return → AttemptFailure (Timeout)
//! ```
//!
//! ## Rules
//! - The handler runs in its own tokio task, so a panic never unwinds into the worker.
//! - Each attempt gets a **child token** of the runtime token.
//! - `TimeoutHit` is published here; `TaskFailed` is left to the worker.
//! - A timed-out handler is never aborted. Aborting would only drop the async
//!   wrapper while `spawn_blocking` work keeps running, so the task stays RUNNING
//!   (and its worker busy) until the handler observes `ctx.cancel` and returns.

use std::time::Duration;

use serde_json::Value;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    core::store::Lease,
    error::TaskError,
    events::{Bus, Event, EventKind},
    retry::{Classify, FailureKind},
    subscribers::panic_message,
    tasks::{Handler, TaskContext},
};

/// Why one attempt did not produce a value.
#[derive(Debug, Clone)]
pub(crate) struct AttemptFailure {
    /// One-line error message stored on the task.
    pub(crate) message: String,
    /// Diagnostic detail stored alongside the message.
    pub(crate) trace: String,
    /// `false` only for failures that must not consume retry budget.
    pub(crate) retryable: bool,
}

impl AttemptFailure {
    fn from_error(err: &TaskError, lease: &Lease) -> Self {
        Self {
            message: err.to_string(),
            trace: format!(
                "{} (attempt {}) failed with {}: {err:#?}",
                lease.task_type,
                lease.attempt,
                err.as_label()
            ),
            retryable: err.failure_kind() != FailureKind::NonRetryable,
        }
    }

    fn panicked(info: String, lease: &Lease) -> Self {
        Self {
            message: format!("handler panicked: {info}"),
            trace: format!(
                "{} (attempt {}) panicked: {info}",
                lease.task_type, lease.attempt
            ),
            retryable: true,
        }
    }
}

/// Executes a single attempt of `lease`.
///
/// A `timeout` of `None` or zero means the attempt may run indefinitely.
pub(crate) async fn run_once(
    lease: &Lease,
    parent: &CancellationToken,
    bus: &Bus,
) -> Result<Value, AttemptFailure> {
    let child = parent.child_token();
    let ctx = TaskContext {
        id: lease.id,
        task_type: lease.task_type.clone(),
        payload: lease.payload.clone(),
        attempt: lease.attempt,
        cancel: child.clone(),
    };
    let handler = lease.handler.clone();
    let mut handle = tokio::spawn(async move { handler.call(ctx).await });

    let joined = match lease.timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, &mut handle).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                child.cancel();
                publish_timeout(bus, lease, dur);
                if let Err(join) = handle.await {
                    if join.is_panic() {
                        warn!(
                            task = %lease.id,
                            info = %panic_message(&*join.into_panic()),
                            "handler panicked after its timeout"
                        );
                    }
                }
                return Err(AttemptFailure::from_error(
                    &TaskError::Timeout { timeout: dur },
                    lease,
                ));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(AttemptFailure::from_error(&err, lease)),
        Err(join) if join.is_panic() => Err(AttemptFailure::panicked(
            panic_message(&*join.into_panic()),
            lease,
        )),
        Err(_aborted) => Err(AttemptFailure::from_error(&TaskError::Canceled, lease)),
    }
}

/// Publishes `TimeoutHit` event (always followed by `TaskFailed`).
fn publish_timeout(bus: &Bus, lease: &Lease, dur: Duration) {
    bus.publish(
        Event::new(EventKind::TimeoutHit)
            .with_task(lease.id)
            .with_task_type(lease.task_type.clone())
            .with_attempt(lease.attempt)
            .with_timeout(dur),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{BlockingFn, HandlerFn, HandlerRef, Payload, Priority, TaskId};
    use serde_json::json;
    use std::sync::Arc;

    fn lease(handler: HandlerRef, timeout: Option<Duration>) -> Lease {
        Lease {
            id: TaskId::next(),
            task_type: Arc::from("resize_image"),
            payload: Payload::new().kwarg("n", json!(7)),
            handler,
            priority: Priority::Normal,
            attempt: 1,
            timeout,
        }
    }

    #[tokio::test]
    async fn returns_handler_value() {
        let h = HandlerFn::arc(|ctx: TaskContext| async move {
            Ok::<_, TaskError>(ctx.payload.get("n").cloned().unwrap_or_default())
        });
        let out = run_once(&lease(h, None), &CancellationToken::new(), &Bus::new(8)).await;
        assert_eq!(out.unwrap(), json!(7));
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retryable() {
        let h = HandlerFn::arc(|_ctx: TaskContext| async {
            Err::<Value, _>(TaskError::fatal("bad input"))
        });
        let err = run_once(&lease(h, None), &CancellationToken::new(), &Bus::new(8))
            .await
            .unwrap_err();
        assert!(!err.retryable);
        assert!(err.message.contains("bad input"));
    }

    #[tokio::test]
    async fn panics_become_retryable_failures() {
        let h = HandlerFn::arc(|_ctx: TaskContext| async {
            if true {
                panic!("kaboom");
            }
            Ok::<Value, TaskError>(Value::Null)
        });
        let err = run_once(&lease(h, None), &CancellationToken::new(), &Bus::new(8))
            .await
            .unwrap_err();
        assert!(err.retryable);
        assert!(err.message.contains("kaboom"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_and_publishes() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let h = HandlerFn::arc(|ctx: TaskContext| async move {
            ctx.cancel.cancelled().await;
            Err::<Value, _>(TaskError::Canceled)
        });
        let err = run_once(
            &lease(h, Some(Duration::from_millis(50))),
            &CancellationToken::new(),
            &bus,
        )
        .await
        .unwrap_err();

        assert!(err.retryable);
        assert!(err.message.contains("timed out"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TimeoutHit);
        assert_eq!(ev.timeout_ms, Some(50));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timeout_waits_for_blocking_handler_to_exit() {
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let h = BlockingFn::arc(move |ctx: TaskContext| {
            while !ctx.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Err::<Value, _>(TaskError::Canceled)
        });
        let err = run_once(
            &lease(h, Some(Duration::from_millis(20))),
            &CancellationToken::new(),
            &Bus::new(8),
        )
        .await
        .unwrap_err();

        assert!(err.message.contains("timed out"));
        assert!(done.load(std::sync::atomic::Ordering::SeqCst));
    }
}
