//! Shortest-estimated-burst selection.

use super::ready::ReadyTable;
use super::trait_def::{ReadyView, SchedulingPolicy};
use crate::thread::ThreadId;

extern crate alloc;
use alloc::vec::Vec;

/// Runs the ready thread with the smallest `estimated_burst`.
///
/// Equal estimates go to the thread that has been ready the longest.
#[derive(Default)]
pub struct ShortestBurstPolicy {
    table: ReadyTable,
}

impl ShortestBurstPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulingPolicy for ShortestBurstPolicy {
    fn enqueue(&mut self, id: ThreadId) {
        self.table.insert(id);
    }

    fn pick_next(&mut self, view: &dyn ReadyView) -> Option<ThreadId> {
        let next = self
            .table
            .take_min_by(view, |info| i64::try_from(info.estimated_burst).unwrap_or(i64::MAX));
        log::trace!("[SJF] picked {:?}", next);
        next
    }

    fn contains(&self, id: ThreadId) -> bool {
        self.table.contains(id)
    }

    fn ready_ids(&self) -> Vec<ThreadId> {
        self.table.ids()
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn name(&self) -> &'static str {
        "Shortest-Burst"
    }
}
