use std::collections::BTreeMap;

use serde::Serialize;

use crate::tasks::TaskStatus;

/// Point-in-time counters of a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Tasks ever submitted; never decreases.
    pub total_tasks: u64,
    /// Tasks waiting in the queue.
    pub pending: usize,
    /// Tasks currently executing.
    pub running: usize,
    /// Workers currently holding a task.
    pub active_workers: usize,
    /// Pool size.
    pub workers: usize,
    /// Count per status; every status is present.
    pub by_status: BTreeMap<TaskStatus, usize>,
}

impl Stats {
    /// Count for one status.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
