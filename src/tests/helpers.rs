//! Test helper utilities and common functionality.
//!
//! [`RecordingArch`] and [`RecordingSpace`] write every transfer, save,
//! restore and destruction into a per-test-thread event log, so tests can
//! assert on the order in which the dispatcher does things.

use crate::arch::Arch;
use crate::kernel::Kernel;
use crate::sched::PolicyKind;
use crate::thread::{AddressSpace, ThreadBuilder, ThreadId};
use crate::time::Tick;

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

type Hook = Box<dyn FnMut()>;

std::thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static INTERRUPTS: Cell<bool> = const { Cell::new(true) };
    static IDLE_HOOK: RefCell<Option<Hook>> = const { RefCell::new(None) };
    static SWITCH_HOOK: RefCell<Option<Hook>> = const { RefCell::new(None) };
}

/// Append an event to this test thread's log.
///
/// Hooks can outlive a test and drop their kernel during thread teardown,
/// after the log itself is gone; such late events are discarded.
pub(crate) fn record<S: Into<String>>(event: S) {
    let event = event.into();
    let _ = EVENTS.try_with(|events| events.borrow_mut().push(event));
}

/// Drain this test thread's log.
pub(crate) fn take_events() -> Vec<String> {
    EVENTS.with(|events| core::mem::take(&mut *events.borrow_mut()))
}

/// Run `hook` each time the CPU idles, in place of a real interrupt.
pub(crate) fn set_idle_hook<F: FnMut() + 'static>(hook: F) {
    IDLE_HOOK.with(|slot| *slot.borrow_mut() = Some(Box::new(hook)));
}

/// Run `hook` inside each context transfer, as the incoming thread would.
pub(crate) fn set_switch_hook<F: FnMut() + 'static>(hook: F) {
    SWITCH_HOOK.with(|slot| *slot.borrow_mut() = Some(Box::new(hook)));
}

/// Clear the log, hooks and interrupt flag left by an earlier test on this thread.
pub(crate) fn reset() {
    take_events();
    INTERRUPTS.with(|flag| flag.set(true));
    IDLE_HOOK.with(|slot| slot.borrow_mut().take());
    SWITCH_HOOK.with(|slot| slot.borrow_mut().take());
}

fn run_hook(slot: &'static std::thread::LocalKey<RefCell<Option<Hook>>>) {
    // Taken out while running so the hook may call back into the kernel.
    let hook = slot.with(|slot| slot.borrow_mut().take());
    if let Some(mut hook) = hook {
        hook();
        slot.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        });
    }
}

/// What [`RecordingArch::init_context`] was asked to set up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RecordedContext {
    pub(crate) entry_point: usize,
    pub(crate) stack_top: usize,
    pub(crate) arg: usize,
}

/// Host architecture that logs instead of switching.
///
/// `context_switch` returns immediately, so the caller continues as the
/// incoming thread, exactly like [`crate::arch::NoOpArch`].
pub(crate) struct RecordingArch;

impl Arch for RecordingArch {
    type SavedContext = RecordedContext;

    unsafe fn context_switch(_prev: *mut Self::SavedContext, _next: *const Self::SavedContext) {
        if INTERRUPTS.with(Cell::get) {
            record("transfer-unmasked");
        } else {
            record("transfer");
        }
        run_hook(&SWITCH_HOOK);
    }

    fn init_context(ctx: &mut Self::SavedContext, entry_point: usize, stack_top: usize, arg: usize) {
        *ctx = RecordedContext {
            entry_point,
            stack_top,
            arg,
        };
    }

    fn enable_interrupts() {
        INTERRUPTS.with(|flag| flag.set(true));
    }

    fn disable_interrupts() {
        INTERRUPTS.with(|flag| flag.set(false));
    }

    fn interrupts_enabled() -> bool {
        INTERRUPTS.with(Cell::get)
    }

    fn wait_for_interrupt() {
        if INTERRUPTS.with(Cell::get) {
            record("idle");
        } else {
            record("idle-masked");
        }
        run_hook(&IDLE_HOOK);
    }
}

/// Address space that logs its save, restore and destruction.
pub(crate) struct RecordingSpace {
    label: String,
}

impl RecordingSpace {
    pub(crate) fn boxed<S: Into<String>>(label: S) -> Box<dyn AddressSpace + Send> {
        Box::new(Self {
            label: label.into(),
        })
    }
}

impl AddressSpace for RecordingSpace {
    fn save_user_state(&mut self) {
        record(format!("save-user:{}", self.label));
    }

    fn save_switch_state(&mut self) {
        record(format!("save-space:{}", self.label));
    }

    fn restore_user_state(&mut self) {
        record(format!("restore-user:{}", self.label));
    }

    fn restore_switch_state(&mut self) {
        record(format!("restore-space:{}", self.label));
    }
}

impl Drop for RecordingSpace {
    fn drop(&mut self) {
        record(format!("destroy:{}", self.label));
    }
}

/// Fresh recording kernel with a clean log.
pub(crate) fn recording_kernel(kind: PolicyKind) -> Kernel<RecordingArch> {
    reset();
    Kernel::new(kind)
}

/// Spawn a thread at tick `at` with the given burst estimate and make it ready.
pub(crate) fn ready_at<A: Arch>(kernel: &Kernel<A>, name: &str, burst: Tick, at: Tick) -> ThreadId {
    let now = kernel.clock().now();
    assert!(at >= now, "ticks only move forward");
    kernel.clock().advance(at - now);
    let id = kernel
        .spawn(ThreadBuilder::new(name).estimated_burst(burst))
        .expect("Failed to spawn thread");
    kernel.mark_ready(id).expect("Failed to mark thread ready");
    id
}

/// Drain the ready container through `select_next`.
pub(crate) fn drain<A: Arch>(kernel: &Kernel<A>) -> Vec<ThreadId> {
    core::iter::from_fn(|| kernel.select_next()).collect()
}

/// Simple linear congruential generator for property testing.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub(crate) fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        min + (self.next_u64() % (max - min))
    }

    pub(crate) fn gen_bool(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }
}
