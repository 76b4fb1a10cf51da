//! # Handler abstraction.
//!
//! A [`Handler`] performs the actual work of one task type. It receives a
//! [`TaskContext`] per attempt carrying the payload, the attempt number and a
//! [`CancellationToken`] that fires when the pool shuts down (or the attempt
//! times out). The common handle type is [`HandlerRef`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::payload::Payload;
use crate::tasks::task::TaskId;

/// Shared handler reference.
pub type HandlerRef = Arc<dyn Handler>;

/// Everything a handler sees of the task it runs.
#[derive(Clone, Debug)]
pub struct TaskContext {
    /// Task id.
    pub id: TaskId,
    /// Registered task type.
    pub task_type: Arc<str>,
    /// Submitted arguments.
    pub payload: Payload,
    /// Attempt number (1-based).
    pub attempt: u32,
    /// Cancelled on shutdown or attempt timeout.
    pub cancel: CancellationToken,
}

impl TaskContext {
    /// True once the handler should stop cooperatively.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// # Asynchronous unit of work for one task type.
///
/// Errors are recorded on the task and fed into the retry path; they never
/// reach the worker loop. Return [`TaskError::Fatal`] to skip remaining retries.
///
/// Handlers are not aborted on timeout: the worker waits until `call` returns,
/// so long-running work should check `ctx.cancel`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
/// use taskpool::{Handler, TaskContext, TaskError};
///
/// struct SyncStock;
///
/// #[async_trait]
/// impl Handler for SyncStock {
///     async fn call(&self, ctx: TaskContext) -> Result<Value, TaskError> {
///         let sku = ctx.payload.get("sku").cloned().unwrap_or(Value::Null);
///         Ok(json!({ "sku": sku, "synced": true }))
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Runs one attempt.
    async fn call(&self, ctx: TaskContext) -> Result<Value, TaskError>;
}
