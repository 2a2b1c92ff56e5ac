//! First-come first-served selection.

use super::ready::ReadyQueue;
use super::trait_def::{ReadyView, SchedulingPolicy};
use crate::thread::ThreadId;

extern crate alloc;
use alloc::vec::Vec;

/// Runs threads in the order they became ready.
///
/// No thread metric is consulted. The round-robin variants use the same
/// selection; their time slice is enforced by the timer interrupt, which
/// yields the running thread when its quantum expires.
pub struct FifoPolicy {
    queue: ReadyQueue,
    name: &'static str,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::named("FIFO")
    }

    pub(crate) fn named(name: &'static str) -> Self {
        Self {
            queue: ReadyQueue::new(),
            name,
        }
    }
}

impl Default for FifoPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingPolicy for FifoPolicy {
    fn enqueue(&mut self, id: ThreadId) {
        self.queue.push(id);
    }

    fn pick_next(&mut self, _view: &dyn ReadyView) -> Option<ThreadId> {
        self.queue.pop()
    }

    fn contains(&self, id: ThreadId) -> bool {
        self.queue.contains(id)
    }

    fn ready_ids(&self) -> Vec<ThreadId> {
        self.queue.ids()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
