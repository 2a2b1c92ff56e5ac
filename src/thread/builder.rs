//! Builder for thread records registered with the kernel.

use super::{AddressSpace, SchedInfo, ThreadId, ThreadRecord};
use crate::arch::Arch;
use crate::config::{self, BASE_PRIORITY, DEFAULT_PRIORITY_OFFSET};
use crate::errors::ThreadResult;
use crate::mem::{Stack, StackSizeClass};
use crate::time::Tick;

extern crate alloc;
use alloc::boxed::Box;
use alloc::string::String;

/// Describes a thread to be registered with [`crate::Kernel::spawn`].
///
/// The new thread starts out NEW; it only competes for the CPU once it has
/// been passed to `mark_ready`.
pub struct ThreadBuilder {
    name: String,
    priority_offset: i32,
    estimated_burst: Tick,
    stack_size: Option<StackSizeClass>,
    entry: Option<(usize, usize)>,
    space: Option<Box<dyn AddressSpace + Send>>,
}

impl ThreadBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            priority_offset: DEFAULT_PRIORITY_OFFSET,
            estimated_burst: 0,
            stack_size: None,
            entry: None,
            space: None,
        }
    }

    /// Priority offset added to [`BASE_PRIORITY`].
    pub fn priority_offset(mut self, offset: i32) -> Self {
        self.priority_offset = offset;
        self
    }

    /// Initial CPU burst estimate for the shortest-burst policy.
    pub fn estimated_burst(mut self, burst: Tick) -> Self {
        self.estimated_burst = burst;
        self
    }

    pub fn stack_size(mut self, size: StackSizeClass) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Start the thread in `entry(arg)`.
    ///
    /// The entry function must call [`crate::Kernel::schedule_tail`] before
    /// anything else and then enable interrupts with
    /// [`crate::Arch::enable_interrupts`]: the first run begins on a fresh
    /// stack with interrupts still masked by the dispatcher. A medium stack
    /// is allocated unless a size was given.
    pub fn entry(mut self, entry: fn(usize), arg: usize) -> Self {
        self.entry = Some((entry as usize, arg));
        self
    }

    /// Attach the user address space built by the program loader.
    pub fn address_space(mut self, space: Box<dyn AddressSpace + Send>) -> Self {
        self.space = Some(space);
        self
    }

    pub(crate) fn build<A: Arch>(self, id: ThreadId) -> ThreadResult<ThreadRecord<A>> {
        let priority = config::priority_for(self.priority_offset)?;

        let size = match (self.stack_size, self.entry) {
            (Some(size), _) => Some(size),
            (None, Some(_)) => Some(StackSizeClass::Medium),
            (None, None) => None,
        };
        let stack = size.map(Stack::allocate).transpose()?;
        let stack_bottom = stack.as_ref().map(Stack::stack_bottom);

        let info = SchedInfo::new(priority, BASE_PRIORITY, self.estimated_burst);
        let mut record = ThreadRecord::new(id, self.name, info, stack, self.space);

        if let (Some((entry, arg)), Some(bottom)) = (self.entry, stack_bottom) {
            A::init_context(record.context_mut(), entry, bottom as usize, arg);
        }

        Ok(record)
    }
}
