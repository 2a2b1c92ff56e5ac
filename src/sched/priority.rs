//! Priority-class selection.

use super::ready::ReadyTable;
use super::trait_def::{ReadyView, SchedulingPolicy};
use crate::thread::ThreadId;

extern crate alloc;
use alloc::vec::Vec;

const VARIANT_NAMES: [&str; 4] = ["Priority-1", "Priority-2", "Priority-3", "Priority-4"];

/// Runs the ready thread with the numerically smallest `priority`.
///
/// Equal priorities go to the thread that has been ready the longest.
/// The four variants share this selection and differ only in the time
/// slice the timer collaborator applies.
pub struct PriorityPolicy {
    table: ReadyTable,
    variant: u8,
}

impl PriorityPolicy {
    /// `variant` is clamped to `0..=3`.
    pub fn new(variant: u8) -> Self {
        Self {
            table: ReadyTable::new(),
            variant: variant.min(3),
        }
    }
}

impl SchedulingPolicy for PriorityPolicy {
    fn enqueue(&mut self, id: ThreadId) {
        self.table.insert(id);
    }

    fn pick_next(&mut self, view: &dyn ReadyView) -> Option<ThreadId> {
        let next = self.table.take_min_by(view, |info| i64::from(info.priority));
        log::trace!("[{}] picked {:?}", self.name(), next);
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
        VARIANT_NAMES[usize::from(self.variant)]
    }
}
