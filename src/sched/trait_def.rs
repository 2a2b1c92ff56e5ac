//! Scheduling policy trait definition.

use crate::arch::Arch;
use crate::thread::{SchedInfo, ThreadId, ThreadRegistry};

extern crate alloc;
use alloc::vec::Vec;

/// Read-only view of thread metrics handed to policies.
///
/// Policies never own or mutate thread records; they only rank the ids
/// they hold by the metrics this view exposes.
pub trait ReadyView {
    /// Scheduling metrics of `id`, or `None` if no such thread exists.
    fn sched_info(&self, id: ThreadId) -> Option<&SchedInfo>;
}

impl<A: Arch> ReadyView for ThreadRegistry<A> {
    fn sched_info(&self, id: ThreadId) -> Option<&SchedInfo> {
        ThreadRegistry::sched_info(self, id)
    }
}

/// Scheduling policy trait.
///
/// A policy owns the ready container: every READY thread's id is held by
/// exactly one policy, and nothing else. The kernel calls [`enqueue`] when a
/// thread becomes READY and [`pick_next`] when the CPU needs a new thread.
///
/// All methods run with interrupts disabled and must not block.
///
/// [`enqueue`]: SchedulingPolicy::enqueue
/// [`pick_next`]: SchedulingPolicy::pick_next
pub trait SchedulingPolicy: Send {
    /// Enqueue a thread that is ready to run.
    ///
    /// The thread's `ready_since` has already been refreshed.
    fn enqueue(&mut self, id: ThreadId);

    /// Pick the next thread to run, removing it from the ready container.
    ///
    /// # Returns
    ///
    /// The next thread to run, or `None` if no threads are ready.
    fn pick_next(&mut self, view: &dyn ReadyView) -> Option<ThreadId>;

    /// Whether `id` is currently in the ready container.
    fn contains(&self, id: ThreadId) -> bool;

    /// Ready ids in container order, for diagnostics.
    fn ready_ids(&self) -> Vec<ThreadId>;

    /// Number of ready threads.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the policy name for debugging
    fn name(&self) -> &'static str;
}
