//! Ready containers.
//!
//! [`ReadyQueue`] is the FIFO used by the default policy. [`ReadyTable`] is
//! the flat table the metric-driven policies scan: they need every READY
//! thread's metric, not just the head of an arrival order.

use super::trait_def::ReadyView;
use crate::thread::{SchedInfo, ThreadId};

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// FIFO of ready thread ids.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: VecDeque<ThreadId>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ThreadId) {
        self.queue.push_back(id);
    }

    pub fn pop(&mut self) -> Option<ThreadId> {
        self.queue.pop_front()
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.queue.contains(&id)
    }

    pub fn ids(&self) -> Vec<ThreadId> {
        self.queue.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Unordered table of ready thread ids, selected by linear scan.
#[derive(Debug, Default)]
pub struct ReadyTable {
    entries: Vec<ThreadId>,
}

impl ReadyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ThreadId) {
        if !self.entries.contains(&id) {
            self.entries.push(id);
        }
    }

    /// Remove and return the entry with the smallest `metric`.
    ///
    /// Ties go to the earliest `ready_since`, then to the lowest id.
    /// Entries the view does not know are skipped.
    pub fn take_min_by<F>(&mut self, view: &dyn ReadyView, metric: F) -> Option<ThreadId>
    where
        F: Fn(&SchedInfo) -> i64,
    {
        let mut best: Option<(usize, (i64, u64, ThreadId))> = None;

        for (index, &id) in self.entries.iter().enumerate() {
            let Some(info) = view.sched_info(id) else {
                continue;
            };
            let key = (metric(info), info.ready_since, id);
            match best {
                Some((_, best_key)) if best_key <= key => {}
                _ => best = Some((index, key)),
            }
        }

        best.map(|(index, _)| self.entries.remove(index))
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.entries.contains(&id)
    }

    pub fn ids(&self) -> Vec<ThreadId> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
