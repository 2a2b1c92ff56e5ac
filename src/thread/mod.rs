//! Thread records and their lifecycle state.
//!
//! A [`ThreadRecord`] is owned by the [`ThreadRegistry`] for its whole life,
//! except for the short window between finishing and being destroyed, when
//! the dispatcher holds it in the pending-destruction slot.

use crate::arch::Arch;
use crate::mem::Stack;
use crate::time::Tick;

extern crate alloc;
use alloc::boxed::Box;
use alloc::string::String;

pub mod builder;
pub mod registry;
pub mod space;

pub use builder::ThreadBuilder;
pub use registry::ThreadRegistry;
pub use space::AddressSpace;

/// Small integer identifying a thread (its process id).
///
/// Ids are handed out sequentially by the registry and never reused.
/// Id 0 is the bootstrap thread the kernel was running on at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u32);

impl core::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ThreadId {
    /// The thread that was running when the kernel started.
    pub const BOOTSTRAP: ThreadId = ThreadId(0);

    /// Create a thread ID from its raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Thread execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Created but never scheduled
    New = 0,
    /// Thread is ready to run
    Ready = 1,
    /// Thread is currently running
    Running = 2,
    /// Thread is blocked waiting for something
    Blocked = 3,
    /// Thread has finished execution
    Finished = 4,
}

/// Scheduling metrics of one thread.
///
/// Policies only ever see this part of a record, through
/// [`crate::sched::ReadyView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedInfo {
    /// Current status
    pub state: ThreadState,
    /// Tick of the most recent READY transition
    pub ready_since: Tick,
    /// Tick of the first READY transition, `None` until then
    pub start_time: Option<Tick>,
    /// Tick at which the thread last blocked
    pub sleep_start: Option<Tick>,
    /// Cumulative ticks spent blocked
    pub total_sleep: Tick,
    /// Predicted length of the next CPU burst
    pub estimated_burst: Tick,
    /// Effective priority, lower runs first
    pub priority: i32,
    /// Static part of the priority
    pub base_priority: i32,
    /// Per-run adjustment requested at creation
    pub priority_offset: i32,
    /// Tick at which the thread last started running
    pub burst_start: Tick,
    /// Decayed recent CPU usage feeding the priority
    pub cpu_usage: Tick,
    /// Cumulative ticks spent running
    pub total_cpu: Tick,
}

impl SchedInfo {
    /// Metrics of a freshly created thread.
    pub fn new(priority: i32, base_priority: i32, estimated_burst: Tick) -> Self {
        Self {
            state: ThreadState::New,
            ready_since: 0,
            start_time: None,
            sleep_start: None,
            total_sleep: 0,
            estimated_burst,
            priority,
            base_priority,
            priority_offset: priority.saturating_sub(base_priority),
            burst_start: 0,
            cpu_usage: 0,
            total_cpu: 0,
        }
    }
}

/// Everything the kernel knows about one thread.
pub struct ThreadRecord<A: Arch> {
    id: ThreadId,
    name: String,
    pub(crate) info: SchedInfo,
    /// Saved machine context, only touched by the dispatcher
    context: A::SavedContext,
    stack: Option<Stack>,
    space: Option<Box<dyn AddressSpace + Send>>,
}

impl<A: Arch> ThreadRecord<A> {
    pub(crate) fn new(
        id: ThreadId,
        name: String,
        info: SchedInfo,
        stack: Option<Stack>,
        space: Option<Box<dyn AddressSpace + Send>>,
    ) -> Self {
        Self {
            id,
            name,
            info,
            context: A::SavedContext::default(),
            stack,
            space,
        }
    }

    /// Record for the thread the kernel is already running on.
    ///
    /// It has no stack of its own (it runs on the boot stack), starts out
    /// RUNNING and uses the most favoured priority.
    pub(crate) fn bootstrap(name: String, base_priority: i32) -> Self {
        let mut info = SchedInfo::new(0, base_priority, 0);
        info.state = ThreadState::Running;
        Self::new(ThreadId::BOOTSTRAP, name, info, None, None)
    }

    /// Get the thread's unique identifier.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Get the thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the thread's scheduling metrics.
    pub fn info(&self) -> &SchedInfo {
        &self.info
    }

    /// Get the thread's current state.
    pub fn state(&self) -> ThreadState {
        self.info.state
    }

    /// Whether this is the thread the kernel booted on.
    pub fn is_bootstrap(&self) -> bool {
        self.id == ThreadId::BOOTSTRAP
    }

    /// Pointer to the saved context, valid for as long as the record lives.
    ///
    /// Records are boxed, so the pointer survives the record moving between
    /// the registry and the pending-destruction slot.
    pub(crate) fn context_ptr(&mut self) -> *mut A::SavedContext {
        &mut self.context as *mut A::SavedContext
    }

    /// The saved machine context, as left by the last switch away from it.
    pub fn context(&self) -> &A::SavedContext {
        &self.context
    }

    pub(crate) fn context_mut(&mut self) -> &mut A::SavedContext {
        &mut self.context
    }

    /// Get the thread's stack, if it owns one.
    pub fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    /// Check if the thread's stack canary is intact (stack overflow detection).
    ///
    /// Threads without a stack of their own always pass.
    pub fn check_stack_integrity(&self) -> bool {
        self.stack.as_ref().map_or(true, Stack::check_canary)
    }

    /// Whether the thread runs a user program.
    pub fn has_address_space(&self) -> bool {
        self.space.is_some()
    }

    pub(crate) fn address_space_mut(&mut self) -> Option<&mut (dyn AddressSpace + Send + 'static)> {
        self.space.as_deref_mut()
    }
}

impl<A: Arch> Drop for ThreadRecord<A> {
    fn drop(&mut self) {
        log::debug!("Deleting thread \"{}\" with pid {}", self.name, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::NoOpArch;
    use crate::mem::StackSizeClass;

    #[test]
    fn test_bootstrap_record() {
        let record = ThreadRecord::<NoOpArch>::bootstrap("main".into(), 50);
        assert!(record.is_bootstrap());
        assert_eq!(record.state(), ThreadState::Running);
        assert_eq!(record.info().priority, 0);
        assert_eq!(record.info().base_priority, 50);
        assert!(record.check_stack_integrity());
        assert!(!record.has_address_space());
    }

    #[test]
    fn test_stack_integrity_follows_canary() {
        let stack = Stack::allocate(StackSizeClass::Small).unwrap();
        let limit = stack.limit();
        let record = ThreadRecord::<NoOpArch>::new(
            ThreadId::new(3),
            "worker".into(),
            SchedInfo::new(150, 50, 0),
            Some(stack),
            None,
        );
        assert!(record.check_stack_integrity());

        unsafe { (limit as *mut u64).write(0) };
        assert!(!record.check_stack_integrity());
    }

    #[test]
    fn test_new_thread_is_never_scheduled() {
        let info = SchedInfo::new(150, 50, 7);
        assert_eq!(info.state, ThreadState::New);
        assert_eq!(info.start_time, None);
        assert_eq!(info.estimated_burst, 7);
        assert_eq!(info.priority_offset, 100);
    }
}
