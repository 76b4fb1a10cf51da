//! Runtime core: queueing, the worker pool and lifecycle.
//!
//! The public API from this module is [`Scheduler`] (with its
//! [`SchedulerBuilder`]), the handler [`Registry`] and the [`Stats`] snapshot.
//!
//! Internal modules:
//! - [`queue`]: priority heap of pending task ids (priority desc, FIFO within a tier);
//! - [`store`]: task records plus the queue behind one lock, single-owner handoff;
//! - [`runner`]: executes one attempt with timeout, panic capture and cancellation;
//! - [`worker`]: one pool slot, records outcomes and schedules backoff re-queues;
//! - [`scheduler`]: submission, queries, start and graceful shutdown;
//! - [`shutdown`]: OS signal handling.

mod builder;
mod queue;
mod registry;
mod runner;
mod scheduler;
mod shutdown;
mod stats;
mod store;
mod worker;

pub use builder::SchedulerBuilder;
pub use registry::Registry;
pub use scheduler::Scheduler;
pub use stats::Stats;
