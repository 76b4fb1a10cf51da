//! # Scheduler: task submission, the worker pool, and graceful shutdown.
//!
//! The [`Scheduler`] owns the handler [`Registry`], the task store (records plus
//! the priority queue), the event bus and a [`SubscriberSet`]. It spawns a
//! fixed pool of workers and stops them within [`Config::grace`].
//!
//! ## High-level architecture
//! ```text
//! submit(type, payload, opts)
//!     │  Registry lookup → Task(PENDING) → store.insert() → notify one worker
//!     ▼
//! ┌────────────── TaskStore (Mutex) ──────────────┐
//! │ PriorityQueue (priority desc, seq asc)        │
//! │ HashMap<TaskId, Task>                         │
//! └───────────────────────────────────────────────┘
//!     │ take(): pop + PENDING→RUNNING under the lock
//!     ▼
//! Worker[0]  Worker[1]  ...  Worker[N-1]         (N = Config::workers)
//!     │
//!     └─► run_once() ─► Handler::call(TaskContext)
//!            ├─ Ok    → COMPLETED
//!            └─ Err   → RETRYING ─[timer: backoff]─► PENDING (re-queued)
//!                     → FAILED    (budget exhausted or Fatal)
//!
//! Event flow:
//!   workers/timers ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!
//! Shutdown path:
//!   shutdown()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► runtime_token.cancel()   → workers stop taking tasks, timers stop
//!     └─► wait for workers within cfg.grace:
//!            ├─ Ok (all joined)   → Bus.publish(AllStoppedWithin)
//!            └─ Timeout exceeded  → Bus.publish(GraceExceeded) + RUNNING ids
//!                                   (stuck workers are detached and still record outcomes)
//!     └─► stop listener → drain the bus → SubscriberSet::shutdown()
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use serde_json::json;
//! use taskpool::{
//!     Config, HandlerFn, Payload, Priority, Scheduler, SubmitOptions, TaskContext, TaskError,
//!     TaskStatus,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::builder(Config::default()).build();
//!     scheduler.register(
//!         "add",
//!         HandlerFn::arc(|ctx: TaskContext| async move {
//!             let nums: Vec<i64> = ctx.payload.args_as().map_err(|e| TaskError::fatal(e.to_string()))?;
//!             Ok::<_, TaskError>(json!(nums.iter().sum::<i64>()))
//!         }),
//!     )?;
//!     scheduler.start().await;
//!
//!     let id = scheduler
//!         .submit(
//!             "add",
//!             Payload::new().arg(2).arg(3),
//!             SubmitOptions::default().with_priority(Priority::High),
//!         )
//!         .await?;
//!
//!     loop {
//!         let snap = scheduler.get(id).await.expect("task exists");
//!         if snap.status == TaskStatus::Completed {
//!             assert_eq!(snap.result, Some(json!(5)));
//!             break;
//!         }
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!     }
//!
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use tokio::{
    sync::{Mutex, broadcast},
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    core::{
        builder::SchedulerBuilder, registry::Registry, shutdown, stats::Stats, store::TaskStore,
        worker::Worker,
    },
    error::{RegistryError, RuntimeError, SubmitError},
    events::{Bus, Event, EventKind},
    subscribers::SubscriberSet,
    tasks::{HandlerRef, Payload, SubmitOptions, Task, TaskId, TaskSnapshot, TaskStatus},
};

/// Priority task queue with a bounded worker pool.
pub struct Scheduler {
    cfg: Arc<Config>,
    bus: Bus,
    listener: std::sync::Mutex<Option<JoinHandle<()>>>,
    listener_token: CancellationToken,
    registry: Registry,
    store: Arc<TaskStore>,
    runtime_token: CancellationToken,
    active: Arc<AtomicUsize>,
    workers: Mutex<JoinSet<()>>,
    started: AtomicBool,
}

impl Scheduler {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: SubscriberSet,
        registry: Registry,
        runtime_token: CancellationToken,
    ) -> Self {
        let listener_token = CancellationToken::new();
        let listener = Self::subscriber_listener(&bus, subs, listener_token.clone());
        Self {
            cfg: Arc::new(cfg),
            bus,
            listener: std::sync::Mutex::new(Some(listener)),
            listener_token,
            registry,
            store: Arc::new(TaskStore::new()),
            runtime_token,
            active: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(JoinSet::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Once `stop` fires the listener forwards whatever is still buffered on the
    /// bus, then closes the set and waits for its workers.
    fn subscriber_listener(
        bus: &Bus,
        set: SubscriberSet,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscriber listener lagged behind the bus");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    () = stop.cancelled() => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Handler registry used for submissions.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers `handler` under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: HandlerRef,
    ) -> Result<(), RegistryError> {
        self.registry.register(name, handler)
    }

    /// Direct receiver of every runtime event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Creates a `Pending` task and queues it.
    ///
    /// Fails when `task_type` has no registered handler or shutdown has begun.
    /// A `None` timeout in `opts` falls back to [`Config::default_timeout`].
    pub async fn submit(
        &self,
        task_type: &str,
        payload: Payload,
        opts: SubmitOptions,
    ) -> Result<TaskId, SubmitError> {
        if self.runtime_token.is_cancelled() {
            return Err(SubmitError::ShuttingDown);
        }
        let handler = self
            .registry
            .get(task_type)
            .ok_or_else(|| SubmitError::UnknownTaskType {
                name: task_type.to_string(),
            })?;

        let opts = SubmitOptions {
            timeout: opts.timeout.or(self.cfg.default_timeout()),
            ..opts
        };
        let task = Task::new(Arc::from(task_type), payload, handler, opts);
        let id = self.store.insert(task).await;

        self.bus.publish(
            Event::new(EventKind::TaskSubmitted)
                .with_task(id)
                .with_task_type(task_type)
                .with_priority(opts.priority),
        );
        debug!(task_id = %id, task_type, priority = %opts.priority.as_label(), "task submitted");
        Ok(id)
    }

    /// Snapshot of one task.
    pub async fn get(&self, id: TaskId) -> Option<TaskSnapshot> {
        self.store.snapshot(id).await
    }

    /// Cancels a `Pending` task; `false` for unknown ids or any other status.
    pub async fn cancel(&self, id: TaskId) -> bool {
        let cancelled = self.store.cancel(id).await;
        if cancelled {
            self.bus
                .publish(Event::new(EventKind::TaskCancelled).with_task(id));
            debug!(task_id = %id, "task cancelled");
        }
        cancelled
    }

    /// Snapshots ordered by id, optionally only those in `status`.
    pub async fn list(&self, status: Option<TaskStatus>) -> Vec<TaskSnapshot> {
        self.store.list(status).await
    }

    /// Current counters.
    pub async fn stats(&self) -> Stats {
        let (total_tasks, by_status) = self.store.counts().await;
        Stats {
            total_tasks,
            pending: by_status.get(&TaskStatus::Pending).copied().unwrap_or(0),
            running: by_status.get(&TaskStatus::Running).copied().unwrap_or(0),
            active_workers: self.active.load(Ordering::SeqCst),
            workers: self.cfg.worker_count(),
            by_status,
        }
    }

    /// Spawns the worker pool. Calling it again is a no-op.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut set = self.workers.lock().await;
        for index in 0..self.cfg.worker_count() {
            let worker = Worker {
                index,
                cfg: Arc::clone(&self.cfg),
                store: Arc::clone(&self.store),
                bus: self.bus.clone(),
                active: Arc::clone(&self.active),
            };
            set.spawn(worker.run(self.runtime_token.clone()));
        }
        info!(workers = self.cfg.worker_count(), "scheduler started");
    }

    /// Stops taking new tasks and waits up to [`Config::grace`] for running ones.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] with the ids still `Running` when
    /// the grace period elapses first. Their workers are detached, not aborted,
    /// so those tasks still reach a terminal state once the handler returns.
    ///
    /// Subscribers have received every event up to and including the final
    /// `AllStoppedWithin`/`GraceExceeded` when this returns.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        info!("shutdown requested");
        self.runtime_token.cancel();

        let mut set = std::mem::take(&mut *self.workers.lock().await);
        let grace = self.cfg.grace;
        let timed = tokio::time::timeout(grace, async {
            while set.join_next().await.is_some() {}
        })
        .await;

        let stuck = match timed {
            Ok(()) => Vec::new(),
            Err(_elapsed) => self.store.running().await,
        };
        if stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            info!("all workers stopped within grace");
            self.stop_listener().await;
            return Ok(());
        }

        set.detach_all();
        self.bus.publish(
            Event::new(EventKind::GraceExceeded).with_reason(format!("stuck={}", stuck.len())),
        );
        warn!(grace_ms = grace.as_millis() as u64, stuck = stuck.len(), "grace exceeded");
        self.stop_listener().await;
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    /// Stops the bus listener and waits (up to `grace`) for subscribers to drain.
    async fn stop_listener(&self) {
        self.listener_token.cancel();
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if tokio::time::timeout(self.cfg.grace, handle).await.is_err() {
            warn!("subscribers did not drain within grace");
        }
    }

    /// Starts the pool, waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start().await;
        if let Err(err) = shutdown::wait_for_shutdown_signal().await {
            warn!(error = %err, "signal registration failed, shutting down");
        }
        self.shutdown().await
    }
}
