//! # Event subscriber trait.
//!
//! Each subscriber gets a dedicated worker task and a bounded queue
//! ([`Subscribe::queue_capacity`]). A slow subscriber only fills its own queue;
//! overflow drops the event for that subscriber and publishes
//! `EventKind::SubscriberOverflow`. Panics are caught and published as
//! `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use taskpool::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct DeadLetters(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for DeadLetters {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskDead {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "dead-letters" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// Use async I/O and handle errors internally; events are delivered FIFO per subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
