//! Backoff and jitter policies.
//!
//! This module groups the knobs that control **how long** to wait between attempts.
//! Both the queue's "re-submit later" path and the standalone [`Retry`](crate::Retry)
//! wrapper consume the same [`BackoffPolicy`].
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first × factor^attempt, capped at max, + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retry storms
//! - [`backoff`]       the plain `min(base × 2^attempt, max)` function, optionally jittered
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=60s, jitter=None.
//! - `JitterPolicy::None`; `Spread` scales the delay by a uniform factor in `[0.5, 1.5)`.

mod backoff;
mod jitter;

pub use backoff::{BackoffPolicy, backoff};
pub use jitter::JitterPolicy;
