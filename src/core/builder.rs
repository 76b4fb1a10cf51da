use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    core::{registry::Registry, scheduler::Scheduler},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Scheduler`] with optional features.
pub struct SchedulerBuilder {
    cfg: Config,
    registry: Registry,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            subscribers: Vec::new(),
        }
    }

    /// Uses a pre-populated handler registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (task lifecycle, failures, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the scheduler. Workers are not spawned until [`Scheduler::start`].
    ///
    /// Must be called inside a tokio runtime: subscriber workers and the bus
    /// listener are spawned here.
    pub fn build(self) -> Arc<Scheduler> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());

        Arc::new(Scheduler::new_internal(
            self.cfg,
            bus,
            subs,
            self.registry,
            CancellationToken::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::events::{Event, EventKind};
    use crate::tasks::{HandlerFn, Payload, SubmitOptions, TaskContext};
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, ev: &Event) {
            let _ = self.0.send(ev.kind);
        }
    }

    #[tokio::test]
    async fn prepared_registry_and_subscribers_are_wired() {
        let registry = Registry::new();
        registry
            .register(
                "noop",
                HandlerFn::arc(|_ctx: TaskContext| async { Ok::<_, TaskError>(Value::Null) }),
            )
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Forward(tx))];

        let scheduler = Scheduler::builder(Config::default())
            .with_registry(registry)
            .with_subscribers(subs)
            .build();
        assert!(scheduler.registry().contains("noop"));

        scheduler
            .submit("noop", Payload::new(), SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(EventKind::TaskSubmitted));
    }

    #[tokio::test]
    async fn shutdown_flushes_final_events_to_subscribers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Forward(tx))];
        let scheduler = Scheduler::builder(Config::default())
            .with_subscribers(subs)
            .build();
        scheduler.start().await;
        scheduler.shutdown().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(kind) = rx.try_recv() {
            kinds.push(kind);
        }
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
    }
}
