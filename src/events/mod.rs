//! Runtime events: types and broadcast bus.
//!
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! Publishers are the scheduler (submit/cancel/shutdown), the workers and the
//! retry timers. The scheduler's listener forwards every event to the
//! [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
