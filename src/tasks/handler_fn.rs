//! # Closure-backed handlers.
//!
//! - [`HandlerFn`] wraps `F: Fn(TaskContext) -> Fut`, producing a fresh future per attempt.
//! - [`BlockingFn`] wraps a synchronous closure and runs it on tokio's blocking pool,
//!   so CPU-heavy or blocking work cannot stall the workers sharing the runtime.
//!
//! No state is shared between attempts unless the closure captures an `Arc<...>` itself.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use taskpool::{BlockingFn, HandlerFn, HandlerRef, TaskContext, TaskError};
//!
//! let ping: HandlerRef = HandlerFn::arc(|_ctx: TaskContext| async move {
//!     Ok::<_, TaskError>(json!("pong"))
//! });
//!
//! let checksum: HandlerRef = BlockingFn::arc(|ctx: TaskContext| {
//!     let n = ctx.payload.args.len() as u64;
//!     Ok::<_, TaskError>(json!(n * 31))
//! });
//! # let _ = (ping, checksum);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskError;
use crate::tasks::handler::{Handler, TaskContext};

/// Async closure handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure and returns a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
    async fn call(&self, ctx: TaskContext) -> Result<Value, TaskError> {
        (self.f)(ctx).await
    }
}

/// Blocking closure handler, executed via `spawn_blocking`.
#[derive(Debug)]
pub struct BlockingFn<F> {
    f: Arc<F>,
}

impl<F> BlockingFn<F> {
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Wraps the closure and returns a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Handler for BlockingFn<F>
where
    F: Fn(TaskContext) -> Result<Value, TaskError> + Send + Sync + 'static,
{
    async fn call(&self, ctx: TaskContext) -> Result<Value, TaskError> {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || (*f)(ctx)).await {
            Ok(res) => res,
            Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
            Err(_) => Err(TaskError::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Payload, TaskId};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn ctx(args: Vec<Value>) -> TaskContext {
        TaskContext {
            id: TaskId::next(),
            task_type: Arc::from("test"),
            payload: Payload {
                args,
                ..Payload::default()
            },
            attempt: 1,
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn async_closure_receives_context() {
        let h = HandlerFn::arc(|ctx: TaskContext| async move {
            Ok::<_, TaskError>(json!(ctx.payload.args.len()))
        });
        assert_eq!(h.call(ctx(vec![json!(1), json!(2)])).await, Ok(json!(2)));
    }

    #[tokio::test]
    async fn blocking_closure_runs_off_the_runtime() {
        let h = BlockingFn::arc(|ctx: TaskContext| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok::<_, TaskError>(json!(ctx.attempt))
        });
        assert_eq!(h.call(ctx(vec![])).await, Ok(json!(1)));
    }

    #[tokio::test]
    async fn blocking_errors_pass_through() {
        let h = BlockingFn::arc(|_ctx: TaskContext| {
            Err::<Value, _>(TaskError::fatal("corrupt file"))
        });
        assert_eq!(
            h.call(ctx(vec![])).await,
            Err(TaskError::fatal("corrupt file"))
        );
    }
}
