//! # taskpool
//!
//! **Taskpool** is an in-process priority task queue with a bounded async
//! worker pool, per-task retry budgets with exponential backoff, and a
//! standalone retry wrapper for unreliable calls.
//!
//! Handlers are registered by name; submissions carry a JSON [`Payload`] and
//! [`SubmitOptions`]. Every task is observable through [`TaskSnapshot`]s and a
//! stream of runtime [`Event`]s.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit("send_email", payload, opts)      submit(...)         cancel(id)
//!            │                                    │                  │
//!            ▼                                    ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                            │
//! │  - Registry      (task type → Handler)                                │
//! │  - TaskStore     (HashMap<TaskId, Task> + PriorityQueue, one lock)    │
//! │  - Bus           (broadcast events)                                   │
//! │  - SubscriberSet (fans out to user subscribers)                       │
//! └──────┬──────────────────┬──────────────────┬──────────────────┬───────┘
//!        ▼                  ▼                  ▼                  │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//!     │  Worker 0    │   │  Worker 1    │   │  Worker N-1  │      │
//!     │ take → run   │   │ take → run   │   │ take → run   │      │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘      │
//!      │ TaskStarting     │ TaskFailed       │ TimeoutHit         │
//!      │ TaskCompleted    │ BackoffSched.    │ TaskDead           │
//!      ▼                  ▼                  ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                        │
//! │                    (capacity: Config::bus_capacity)                   │
//! └──────────────────────────────────┬────────────────────────────────────┘
//!                                    ▼
//!                        ┌────────────────────────┐
//!                        │  subscriber_listener   │
//!                        └───────────┬────────────┘
//!                                    ▼
//!                              SubscriberSet
//!                           ┌────────┼────────┐
//!                           ▼        ▼        ▼
//!                       sub1.on  sub2.on  subN.on
//!                       _event() _event() _event()
//! ```
//!
//! ### Task lifecycle
//! ```text
//!             submit
//!               │
//!               ▼
//!   cancel ◄── PENDING ◄──────────────── RETRYING
//!     │         │ worker takes it           ▲  (timer: retry_delay × 2^n, capped)
//!     ▼         ▼                           │
//! CANCELLED   RUNNING ── Err, budget left ──┘
//!               │
//!               ├── Ok ──────────────────────► COMPLETED
//!               └── Err, exhausted / Fatal ──► FAILED
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------------|---------------------------------------------|
//! | **Queue**         | Priority tiers, FIFO within a tier, bounded worker pool.          | [`Scheduler`], [`Priority`], [`Stats`]      |
//! | **Handlers**      | Async or blocking code registered by task type.                   | [`Handler`], [`HandlerFn`], [`BlockingFn`]  |
//! | **Retry wrapper** | Re-invoke any fallible call with backoff and failure filtering.   | [`Retry`], [`RetryContext`], [`Classify`]   |
//! | **Policies**      | Backoff curve and jitter.                                         | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, alerting).            | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for submission, execution and shutdown.              | [`TaskError`], [`SubmitError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                                      | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a [`LogWriter`] subscriber that turns events into `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use taskpool::{
//!     Config, HandlerFn, Payload, Priority, Scheduler, SubmitOptions, TaskContext, TaskError,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.workers = 2;
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = vec![Arc::new(taskpool::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = Vec::new();
//!
//!     let scheduler = Scheduler::builder(cfg).with_subscribers(subs).build();
//!     scheduler.register(
//!         "greet",
//!         HandlerFn::arc(|ctx: TaskContext| async move {
//!             let name = ctx.payload.get("name").and_then(|v| v.as_str()).unwrap_or("world");
//!             Ok::<_, TaskError>(json!(format!("hello, {name}")))
//!         }),
//!     )?;
//!     scheduler.start().await;
//!
//!     let id = scheduler
//!         .submit(
//!             "greet",
//!             Payload::new().kwarg("name", "ops"),
//!             SubmitOptions::default()
//!                 .with_priority(Priority::High)
//!                 .with_timeout(Duration::from_secs(5)),
//!         )
//!         .await?;
//!     println!("submitted task {id}");
//!
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod retry;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Registry, Scheduler, SchedulerBuilder, Stats};
pub use error::{RegistryError, RuntimeError, SubmitError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, backoff};
pub use retry::{Classify, FailureKind, Retry, RetryContext, RetryEvent};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    BlockingFn, Handler, HandlerFn, HandlerRef, Payload, Priority, SubmitOptions, TaskContext,
    TaskId, TaskSnapshot, TaskStatus,
};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
