//! # Task model.
//!
//! - [`Handler`] / [`HandlerFn`] / [`BlockingFn`] - the code that performs a task type
//! - [`TaskContext`] - what a handler receives per attempt
//! - [`Payload`] - positional and keyword arguments
//! - [`SubmitOptions`] - priority, retry budget, retry delay, timeout
//! - [`TaskStatus`] / [`Priority`] - state machine and dequeue tiers
//! - [`TaskId`] / [`TaskSnapshot`] - identity and read-only view of a task

mod handler;
mod handler_fn;
mod options;
mod payload;
mod priority;
mod status;
mod task;

pub use handler::{Handler, HandlerRef, TaskContext};
pub use handler_fn::{BlockingFn, HandlerFn};
pub use options::SubmitOptions;
pub use payload::Payload;
pub use priority::Priority;
pub use status::TaskStatus;
pub use task::{TaskId, TaskSnapshot};

pub(crate) use task::{FailureOutcome, Task};
