//! Platform abstraction for context transfer and interrupt control.
//!
//! The scheduling core never touches registers itself. The embedding kernel
//! implements [`Arch`] for its CPU and hands the type to [`crate::Kernel`].

use core::marker::PhantomData;

/// Architecture abstraction trait.
///
/// This trait must be implemented for each supported CPU architecture to
/// provide the low-level context transfer and interrupt masking the
/// dispatcher relies on.
///
/// # Safety
///
/// Implementations involve direct hardware manipulation and inline assembly.
/// All methods marked as unsafe have specific preconditions that must be
/// upheld by the caller.
pub trait Arch {
    /// Architecture-specific saved context type.
    ///
    /// This type must contain all CPU registers and state needed to fully
    /// restore a thread's execution context.
    type SavedContext: Send + Sync + Default;

    /// Switch from one thread context to another.
    ///
    /// Saves the running machine state into `prev`, loads `next` and jumps to
    /// it. The call "returns" only when some later switch resumes `prev`.
    ///
    /// # Safety
    ///
    /// - `prev` must point to a valid, properly aligned SavedContext
    /// - `next` must point to a valid, properly aligned SavedContext
    /// - The caller must ensure the memory pointed to by both pointers remains
    ///   valid for the duration of this call
    /// - Must be called with interrupts disabled
    /// - The `next` context must represent a valid execution state
    unsafe fn context_switch(prev: *mut Self::SavedContext, next: *const Self::SavedContext);

    /// Prepare a fresh context so that switching to it starts `entry_point`
    /// on the stack ending at `stack_top`, with `arg` as its first argument.
    fn init_context(ctx: &mut Self::SavedContext, entry_point: usize, stack_top: usize, arg: usize);

    /// Enable interrupts on the current CPU.
    fn enable_interrupts();

    /// Disable interrupts on the current CPU.
    fn disable_interrupts();

    /// Check if interrupts are currently enabled.
    fn interrupts_enabled() -> bool;

    /// Idle the CPU until the next interrupt has been serviced.
    ///
    /// Called with interrupts enabled while no thread is ready to run.
    fn wait_for_interrupt();
}

/// Disables interrupts for its lifetime and restores the previous state on drop.
///
/// This is the only mutual exclusion the scheduler uses: on a uniprocessor a
/// path that cannot be interrupted cannot be interleaved with anything.
pub struct InterruptGuard<A: Arch> {
    was_enabled: bool,
    _arch: PhantomData<A>,
}

impl<A: Arch> InterruptGuard<A> {
    /// Disable interrupts, remembering whether they were on.
    pub fn new() -> Self {
        let was_enabled = A::interrupts_enabled();
        A::disable_interrupts();
        Self {
            was_enabled,
            _arch: PhantomData,
        }
    }

    /// Whether interrupts were enabled when the guard was taken.
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl<A: Arch> Default for InterruptGuard<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Arch> Drop for InterruptGuard<A> {
    fn drop(&mut self) {
        if self.was_enabled {
            A::enable_interrupts();
        }
    }
}

/// A no-op architecture implementation for host builds.
///
/// `context_switch` returns immediately, so the caller simply continues as
/// the incoming thread. Useful for simulating scheduling decisions; it
/// cannot run real thread bodies.
pub struct NoOpArch;

impl Arch for NoOpArch {
    type SavedContext = ();

    unsafe fn context_switch(_prev: *mut Self::SavedContext, _next: *const Self::SavedContext) {
        // No-op for testing
    }

    fn init_context(_ctx: &mut Self::SavedContext, _entry_point: usize, _stack_top: usize, _arg: usize) {}

    fn enable_interrupts() {}

    fn disable_interrupts() {}

    fn interrupts_enabled() -> bool {
        true
    }

    fn wait_for_interrupt() {
        core::hint::spin_loop();
    }
}
