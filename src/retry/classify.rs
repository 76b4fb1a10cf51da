//! # Failure classification.
//!
//! A retry loop only repeats an operation when its error maps to a
//! [`FailureKind`] present in the loop's allow-list. [`FailureKind::NonRetryable`]
//! is never retried, whatever the allow-list says.

use std::io;

/// Coarse category of a failure, used to decide retry eligibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection refused/reset/aborted and similar transport failures.
    Network,
    /// An operation or I/O call timed out.
    Timeout,
    /// Explicitly marked as safe to retry.
    Retryable,
    /// Explicitly marked as not to be retried.
    NonRetryable,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Kinds retried by default: network, timeout and the explicit retryable marker.
    pub const DEFAULT_RETRYABLE: [FailureKind; 3] = [
        FailureKind::Network,
        FailureKind::Timeout,
        FailureKind::Retryable,
    ];

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Retryable => "retryable",
            FailureKind::NonRetryable => "non_retryable",
            FailureKind::Other => "other",
        }
    }
}

/// Maps an error onto a [`FailureKind`].
///
/// # Example
/// ```
/// use taskpool::{Classify, FailureKind};
///
/// #[derive(Debug)]
/// enum SupplierError { RateLimited, BadSku }
///
/// impl Classify for SupplierError {
///     fn failure_kind(&self) -> FailureKind {
///         match self {
///             SupplierError::RateLimited => FailureKind::Retryable,
///             SupplierError::BadSku => FailureKind::NonRetryable,
///         }
///     }
/// }
///
/// assert_eq!(SupplierError::BadSku.failure_kind(), FailureKind::NonRetryable);
/// ```
pub trait Classify {
    /// Returns the category of this failure.
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for io::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::Interrupted => FailureKind::Network,
            _ => FailureKind::Other,
        }
    }
}

impl Classify for tokio::time::error::Elapsed {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Timeout
    }
}
