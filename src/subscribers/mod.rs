//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for observability consumers (logging,
//! metrics, alerting). [`SubscriberSet`] fans every runtime event out to all
//! subscribers through per-subscriber bounded queues.
//!
//! ```text
//! Bus ──► scheduler listener ──► SubscriberSet::emit(&Event)
//!                                  ├──► [queue 1] ──► worker 1 ──► sub1.on_event()
//!                                  └──► [queue N] ──► worker N ──► subN.on_event()
//! ```

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
