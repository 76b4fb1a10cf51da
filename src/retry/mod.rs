//! Retry controller for unreliable calls, independent of the queue.
//!
//! - [`Classify`] / [`FailureKind`] decide whether an error is eligible for retry;
//! - [`RetryContext`] tracks attempts, the overall deadline and the next delay of one retry loop;
//! - [`Retry`] wraps an operation (async or blocking) and re-invokes it until success or exhaustion.
//!
//! ## Flow
//! ```text
//! Retry::run(op)
//!   loop {
//!     ├─► ctx.advance()           (attempt += 1, start clock on first call)
//!     ├─► op() ── Ok ──► return Ok
//!     │       └─ Err(e)
//!     ├─► ctx.should_retry(&e)    (non-retryable? exhausted? deadline? allow-listed?)
//!     │       └─ false ──► return Err(e) unchanged
//!     ├─► delay = ctx.next_delay()
//!     ├─► on_retry(&RetryEvent)   (observer, synchronous)
//!     └─► sleep(delay)
//!   }
//! ```

mod classify;
mod context;
mod wrapper;

pub use classify::{Classify, FailureKind};
pub use context::RetryContext;
pub use wrapper::{Retry, RetryEvent};
