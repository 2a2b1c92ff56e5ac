//! Thread stacks with overflow canaries.
//!
//! A [`Stack`] is owned by exactly one thread record and is freed when that
//! record is dropped, which for a finished thread only happens after the
//! dispatcher has switched away from it.

use core::alloc::Layout;
use core::ptr::NonNull;

extern crate alloc;

use crate::errors::MemoryError;

/// Value written at the lowest address of every stack.
///
/// Stacks grow down, so a thread that overruns its stack overwrites this
/// word first.
pub const STACK_CANARY: u64 = 0xDEAD_BEEF_CAFE_BABE;

const STACK_ALIGN: usize = 16;

/// Stack size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSizeClass {
    /// Small stack: 4 KiB
    Small = 4096,
    /// Medium stack: 16 KiB
    Medium = 16384,
    /// Large stack: 64 KiB
    Large = 65536,
}

impl StackSizeClass {
    /// Get the size in bytes for this stack class.
    pub fn size(self) -> usize {
        self as usize
    }
}

/// A heap-allocated thread stack.
pub struct Stack {
    /// Lowest address of the allocation; holds the canary
    memory: NonNull<u8>,
    size_class: StackSizeClass,
}

impl Stack {
    /// Allocate a stack and install the overflow canary.
    pub fn allocate(size_class: StackSizeClass) -> Result<Self, MemoryError> {
        let layout = Self::layout(size_class.size())?;
        // SAFETY: the layout has a non-zero size.
        let memory = unsafe { alloc::alloc::alloc(layout) };
        let memory = NonNull::new(memory).ok_or(MemoryError::OutOfMemory)?;

        let stack = Self { memory, size_class };
        stack.install_canary();
        Ok(stack)
    }

    fn layout(size: usize) -> Result<Layout, MemoryError> {
        if size < core::mem::size_of::<u64>() {
            return Err(MemoryError::InvalidStackSize(size));
        }
        Layout::from_size_align(size, STACK_ALIGN).map_err(|_| MemoryError::InvalidStackSize(size))
    }

    /// Get the usable stack size in bytes.
    pub fn size(&self) -> usize {
        self.size_class.size()
    }

    /// Get the stack size class.
    pub fn size_class(&self) -> StackSizeClass {
        self.size_class
    }

    /// Initial stack pointer: the highest address, aligned down to 16 bytes.
    pub fn stack_bottom(&self) -> *mut u8 {
        let end = self.memory.as_ptr() as usize + self.size();
        (end & !(STACK_ALIGN - 1)) as *mut u8
    }

    /// Lowest usable address, where the canary lives.
    pub fn limit(&self) -> *mut u8 {
        self.memory.as_ptr()
    }

    fn install_canary(&self) {
        // SAFETY: the allocation is at least 8 bytes and 16-byte aligned.
        unsafe { (self.limit() as *mut u64).write(STACK_CANARY) }
    }

    /// `true` while the canary is intact.
    pub fn check_canary(&self) -> bool {
        // SAFETY: see install_canary.
        unsafe { (self.limit() as *const u64).read() == STACK_CANARY }
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout(self.size()) {
            // SAFETY: allocated in Stack::allocate with the same layout.
            unsafe { alloc::alloc::dealloc(self.memory.as_ptr(), layout) }
        }
    }
}

unsafe impl Send for Stack {}
unsafe impl Sync for Stack {}
