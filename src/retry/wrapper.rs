//! # General-purpose retry wrapper.
//!
//! [`Retry`] protects calls to unreliable external services (supplier and
//! marketplace APIs, mail relays, ...) by re-invoking them in place until they
//! succeed, hit a non-retryable error, or run out of attempts. It does not go
//! through the task queue.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use taskpool::{Retry, TaskError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let calls = AtomicU32::new(0);
//! let retry = Retry::new()
//!     .named("supplier.fetch_stock")
//!     .max_attempts(3)
//!     .delay(Duration::from_millis(1));
//!
//! let stock = retry
//!     .run(|| async {
//!         if calls.fetch_add(1, Ordering::SeqCst) == 0 {
//!             return Err(TaskError::network("connection reset"));
//!         }
//!         Ok::<_, TaskError>(42)
//!     })
//!     .await;
//!
//! assert_eq!(stock, Ok(42));
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! # }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::policies::JitterPolicy;
use crate::retry::classify::{Classify, FailureKind};
use crate::retry::context::RetryContext;

/// Information handed to the `on_retry` observer before each retry.
pub struct RetryEvent<'a> {
    /// Name of the wrapped operation.
    pub operation: &'a str,
    /// Attempt that just failed (1-based).
    pub attempt: u32,
    /// Configured maximum number of attempts.
    pub max_attempts: u32,
    /// Delay before the next attempt.
    pub delay: Duration,
    /// The failure of this attempt.
    pub error: &'a dyn fmt::Display,
}

type Observer = Arc<dyn Fn(&RetryEvent<'_>) + Send + Sync>;

/// Retry wrapper configuration.
///
/// Defaults: 3 attempts, 1s base delay, exponential backoff capped at 60s, no jitter,
/// retry on network/timeout/retryable failures, no overall timeout, logging enabled.
#[derive(Clone)]
pub struct Retry {
    name: Cow<'static, str>,
    max_attempts: u32,
    delay: Duration,
    backoff: bool,
    max_delay: Duration,
    jitter: JitterPolicy,
    retry_on: Vec<FailureKind>,
    timeout: Option<Duration>,
    on_retry: Option<Observer>,
    log_errors: bool,
}

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .field("retry_on", &self.retry_on)
            .field("timeout", &self.timeout)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "<observer>"))
            .field("log_errors", &self.log_errors)
            .finish()
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("operation"),
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: true,
            max_delay: Duration::from_secs(60),
            jitter: JitterPolicy::None,
            retry_on: FailureKind::DEFAULT_RETRYABLE.to_vec(),
            timeout: None,
            on_retry: None,
            log_errors: true,
        }
    }
}

impl Retry {
    /// Creates a wrapper with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in logs and passed to the observer.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Total number of calls allowed (clamped to at least 1).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the first retry.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Whether the delay doubles per attempt (`true`) or stays constant.
    pub fn backoff(mut self, enabled: bool) -> Self {
        self.backoff = enabled;
        self
    }

    /// Cap on a single delay.
    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    /// Jitter applied to every delay.
    pub fn jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Failure kinds eligible for retry.
    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// Overall time budget measured from the first attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Observer invoked synchronously before each retry.
    ///
    /// If it needs async work, it must spawn that work itself.
    pub fn on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&RetryEvent<'_>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// Whether failed attempts are logged through `tracing`.
    pub fn log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }

    /// Builds a fresh [`RetryContext`] for one loop.
    pub fn context(&self) -> RetryContext {
        RetryContext::new(self.max_attempts, self.delay, self.backoff, self.timeout)
            .with_max_delay(self.max_delay)
            .with_jitter(self.jitter)
            .with_retry_on(self.retry_on.iter().copied())
    }

    /// Runs an async operation until it succeeds or retries are exhausted.
    ///
    /// The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut ctx = self.context();
        loop {
            ctx.advance();
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match self.before_retry(&ctx, &err) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => return Err(err),
                },
            }
        }
    }

    /// Runs a blocking operation, sleeping the current thread between attempts.
    ///
    /// Do not call from inside an async task; use [`run`](Self::run) there.
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        let mut ctx = self.context();
        loop {
            ctx.advance();
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => match self.before_retry(&ctx, &err) {
                    Some(delay) => std::thread::sleep(delay),
                    None => return Err(err),
                },
            }
        }
    }

    /// Decides the fate of a failed attempt; `Some(delay)` means retry.
    fn before_retry<E>(&self, ctx: &RetryContext, err: &E) -> Option<Duration>
    where
        E: Classify + fmt::Display,
    {
        if !ctx.should_retry(err) {
            if self.log_errors {
                warn!(
                    operation = %self.name,
                    attempt = ctx.attempt(),
                    max_attempts = ctx.max_attempts(),
                    kind = err.failure_kind().as_label(),
                    error = %err,
                    "giving up"
                );
            }
            return None;
        }

        let delay = ctx.next_delay();
        if self.log_errors {
            warn!(
                operation = %self.name,
                attempt = ctx.attempt(),
                max_attempts = ctx.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed; retrying"
            );
        } else {
            debug!(operation = %self.name, attempt = ctx.attempt(), "retrying");
        }

        if let Some(observer) = &self.on_retry {
            observer(&RetryEvent {
                operation: &self.name,
                attempt: ctx.attempt(),
                max_attempts: ctx.max_attempts(),
                delay,
                error: err,
            });
        }
        Some(delay)
    }
}
