//! # Task store: task records plus the pending queue under one lock.
//!
//! All state transitions happen while the lock is held, so a task can be
//! handed to at most one worker: [`TaskStore::take`] pops the queue and moves
//! the record to `Running` atomically. Entries whose task is no longer
//! `Pending` (cancelled while queued) are skipped when popped.
//!
//! Waiting workers are woken through a [`Notify`] on every push.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, Notify};

use crate::core::queue::PriorityQueue;
use crate::policies::JitterPolicy;
use crate::tasks::{
    FailureOutcome, HandlerRef, Payload, Priority, Task, TaskId, TaskSnapshot, TaskStatus,
};

/// Everything a worker needs to run one attempt.
pub(crate) struct Lease {
    pub(crate) id: TaskId,
    pub(crate) task_type: Arc<str>,
    pub(crate) payload: Payload,
    pub(crate) handler: HandlerRef,
    pub(crate) priority: Priority,
    pub(crate) attempt: u32,
    pub(crate) timeout: Option<Duration>,
}

#[derive(Default)]
struct State {
    queue: PriorityQueue,
    tasks: HashMap<TaskId, Task>,
    total: u64,
}

#[derive(Default)]
pub(crate) struct TaskStore {
    state: Mutex<State>,
    ready: Notify,
}

impl TaskStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a new `Pending` task and queues it.
    pub(crate) async fn insert(&self, task: Task) -> TaskId {
        let id = task.id;
        {
            let mut st = self.state.lock().await;
            st.queue.push(id, task.options.priority);
            st.tasks.insert(id, task);
            st.total += 1;
        }
        self.ready.notify_one();
        id
    }

    /// Pops the best pending task, if any, and marks it `Running`.
    pub(crate) async fn try_take(&self) -> Option<Lease> {
        let mut st = self.state.lock().await;
        let State { queue, tasks, .. } = &mut *st;

        while let Some(entry) = queue.pop() {
            let Some(task) = tasks.get_mut(&entry.id) else {
                continue;
            };
            let Some(attempt) = task.start() else {
                continue;
            };
            return Some(Lease {
                id: task.id,
                task_type: Arc::clone(&task.task_type),
                payload: task.payload.clone(),
                handler: Arc::clone(&task.handler),
                priority: task.options.priority,
                attempt,
                timeout: task.options.timeout,
            });
        }
        None
    }

    /// Like [`try_take`](Self::try_take), but waits up to `wait` for a push.
    pub(crate) async fn take(&self, wait: Duration) -> Option<Lease> {
        if let Some(lease) = self.try_take().await {
            return Some(lease);
        }
        let _ = tokio::time::timeout(wait, self.ready.notified()).await;
        self.try_take().await
    }

    pub(crate) async fn complete(&self, id: TaskId, value: Value) -> bool {
        let mut st = self.state.lock().await;
        st.tasks.get_mut(&id).is_some_and(|t| t.complete(value))
    }

    pub(crate) async fn fail(
        &self,
        id: TaskId,
        error: String,
        trace: String,
        retryable: bool,
        max_delay: Duration,
        jitter: JitterPolicy,
    ) -> Option<FailureOutcome> {
        let mut st = self.state.lock().await;
        st.tasks
            .get_mut(&id)?
            .fail(error, trace, retryable, max_delay, jitter)
    }

    /// `Retrying → Pending` with a fresh queue position; returns the priority.
    pub(crate) async fn requeue(&self, id: TaskId) -> Option<Priority> {
        let priority = {
            let mut st = self.state.lock().await;
            let task = st.tasks.get_mut(&id)?;
            if !task.requeue() {
                return None;
            }
            let priority = task.options.priority;
            st.queue.push(id, priority);
            priority
        };
        self.ready.notify_one();
        Some(priority)
    }

    /// `Pending → Cancelled`; the stale queue entry is skipped later.
    pub(crate) async fn cancel(&self, id: TaskId) -> bool {
        let mut st = self.state.lock().await;
        st.tasks.get_mut(&id).is_some_and(Task::cancel)
    }

    pub(crate) async fn snapshot(&self, id: TaskId) -> Option<TaskSnapshot> {
        let st = self.state.lock().await;
        st.tasks.get(&id).map(Task::snapshot)
    }

    /// Snapshots ordered by id, optionally filtered by status.
    pub(crate) async fn list(&self, status: Option<TaskStatus>) -> Vec<TaskSnapshot> {
        let st = self.state.lock().await;
        let mut out: Vec<TaskSnapshot> = st
            .tasks
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .map(Task::snapshot)
            .collect();
        out.sort_unstable_by_key(|s| s.id);
        out
    }

    /// Total ever submitted, plus a count per status (every status present).
    pub(crate) async fn counts(&self) -> (u64, BTreeMap<TaskStatus, usize>) {
        let st = self.state.lock().await;
        let mut by_status: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for task in st.tasks.values() {
            *by_status.entry(task.status).or_default() += 1;
        }
        (st.total, by_status)
    }

    /// Ids of tasks currently `Running`.
    pub(crate) async fn running(&self) -> Vec<TaskId> {
        let st = self.state.lock().await;
        let mut ids: Vec<TaskId> = st
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Running)
            .map(|t| t.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{HandlerFn, SubmitOptions, TaskContext};

    fn task(priority: Priority) -> Task {
        let handler: HandlerRef =
            HandlerFn::arc(|_ctx: TaskContext| async { Ok::<_, TaskError>(Value::Null) });
        Task::new(
            Arc::from("noop"),
            Payload::new(),
            handler,
            SubmitOptions::default().with_priority(priority),
        )
    }

    #[tokio::test]
    async fn take_marks_running_and_skips_cancelled() {
        let store = TaskStore::new();
        let a = store.insert(task(Priority::High)).await;
        let b = store.insert(task(Priority::Low)).await;

        assert!(store.cancel(a).await);
        let lease = store.try_take().await.unwrap();
        assert_eq!(lease.id, b);
        assert_eq!(lease.attempt, 1);
        assert_eq!(store.snapshot(b).await.unwrap().status, TaskStatus::Running);
        assert!(store.try_take().await.is_none());
        assert_eq!(store.running().await, vec![b]);
    }

    #[tokio::test(start_paused = true)]
    async fn take_wakes_on_insert() {
        let store = Arc::new(TaskStore::new());
        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.take(Duration::from_secs(60)).await })
        };
        tokio::task::yield_now().await;
        let id = store.insert(task(Priority::Normal)).await;

        let lease = waiter.await.unwrap().unwrap();
        assert_eq!(lease.id, id);
    }

    #[tokio::test]
    async fn requeue_goes_to_the_back_of_its_tier() {
        let store = TaskStore::new();
        let first = store.insert(task(Priority::Normal)).await;
        let lease = store.try_take().await.unwrap();
        assert_eq!(lease.id, first);

        let outcome = store
            .fail(
                first,
                "boom".into(),
                "trace".into(),
                true,
                Duration::from_secs(3600),
                JitterPolicy::None,
            )
            .await;
        assert!(matches!(outcome, Some(FailureOutcome::Retry { .. })));

        let second = store.insert(task(Priority::Normal)).await;
        assert_eq!(store.requeue(first).await, Some(Priority::Normal));
        assert!(store.requeue(first).await.is_none());

        assert_eq!(store.try_take().await.unwrap().id, second);
        assert_eq!(store.try_take().await.unwrap().id, first);
    }

    #[tokio::test]
    async fn counts_cover_every_status() {
        let store = TaskStore::new();
        let a = store.insert(task(Priority::Normal)).await;
        store.insert(task(Priority::Normal)).await;
        store.cancel(a).await;

        let (total, by_status) = store.counts().await;
        assert_eq!(total, 2);
        assert_eq!(by_status.len(), TaskStatus::ALL.len());
        assert_eq!(by_status[&TaskStatus::Pending], 1);
        assert_eq!(by_status[&TaskStatus::Cancelled], 1);
        assert_eq!(by_status[&TaskStatus::Failed], 0);

        let cancelled = store.list(Some(TaskStatus::Cancelled)).await;
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, a);
        assert_eq!(store.list(None).await.len(), 2);
    }
}
