//! # Priority queue of pending task ids.
//!
//! Entries are ordered by `(priority desc, sequence asc)`: a higher tier always
//! wins, and within a tier the earliest enqueued entry is taken first. Every
//! push (including a re-queue after backoff) takes a fresh sequence number.
//!
//! The queue holds ids only; whether an entry is still eligible (e.g. not
//! cancelled meanwhile) is decided by the task store when popping.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::tasks::{Priority, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueuedTask {
    pub(crate) priority: Priority,
    pub(crate) seq: u64,
    pub(crate) id: TaskId,
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority first, then lower seq.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub(crate) struct PriorityQueue {
    heap: BinaryHeap<QueuedTask>,
    next_seq: u64,
}

impl PriorityQueue {
    pub(crate) fn push(&mut self, id: TaskId, priority: Priority) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedTask { priority, seq, id });
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedTask> {
        self.heap.pop()
    }
}
