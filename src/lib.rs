#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]

//! Uniprocessor thread scheduling and dispatch core for small kernels.
//!
//! This library decides which thread runs next on a single CPU and performs
//! the handoff between thread contexts. It owns the thread table, the ready
//! container and the current-thread slot; the embedding kernel supplies the
//! CPU-specific pieces through the [`Arch`] trait and drives the clock.
//!
//! # Policies
//!
//! The policy is fixed when the [`Kernel`] is created, usually from the
//! selector of a batch file:
//!
//! - FIFO (default)
//! - shortest estimated CPU burst
//! - four priority-class variants, with UNIX-style priority decay
//! - four round-robin variants, which select in FIFO order and leave time
//!   slicing to the timer
//!
//! # Features
//!
//! - `std-shim`: build on a hosted target without installing a panic handler
//!
//! # Quick Start
//!
//! ```ignore
//! use uniproc_sched::{Arch, BatchConfig, Kernel, PolicyKind};
//! use spin::Lazy;
//!
//! static KERNEL: Lazy<Kernel<MyArch>> = Lazy::new(|| Kernel::new(PolicyKind::Fifo));
//!
//! fn kernel_main(config: BatchConfig) -> ! {
//!     KERNEL
//!         .seed_batch(&config, |job, builder| {
//!             let space = load_program(&job.program)?;
//!             Some(builder.address_space(space).entry(user_trampoline, 0))
//!         })
//!         .expect("Failed to seed batch");
//!
//!     // The boot thread is done; hand the CPU to the batch.
//!     KERNEL.finish_current().expect("Failed to start batch");
//!     unreachable!()
//! }
//!
//! fn user_trampoline(_arg: usize) {
//!     KERNEL.schedule_tail();
//!     // The first run starts with interrupts masked.
//!     MyArch::enable_interrupts();
//!     enter_user_mode();
//! }
//! ```
//!
//! # Architecture
//!
//! - [`thread`]: thread records and the registry that owns them
//! - [`sched`]: policies, ready containers and per-transition bookkeeping
//! - [`kernel`]: the dispatcher tying them together
//! - [`mem`]: canary-protected thread stacks
//! - [`time`]: the tick counter

// Core modules
pub mod arch;
pub mod config;
pub mod errors;
pub mod kernel;
pub mod mem;
pub mod sched;
pub mod thread;
pub mod time;

#[cfg(test)]
mod tests;

#[cfg(test)]
extern crate std;

extern crate alloc;

// Panic handler for bare-metal
#[cfg(all(not(test), not(feature = "std-shim")))]
use core::panic::PanicInfo;

#[cfg(all(not(test), not(feature = "std-shim")))]
#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    // Nothing can be scheduled after a fatal error; halt here.
    loop {
        core::hint::spin_loop();
    }
}

// ============================================================================
// Public API
// ============================================================================

// Architecture abstraction
pub use arch::{Arch, InterruptGuard, NoOpArch};

// Kernel
pub use kernel::{Kernel, SchedStats};

// Configuration
pub use config::{BatchConfig, BatchJob};

// Scheduler
pub use sched::{PolicyKind, ReadyView, SchedulingPolicy};

// Threads
pub use thread::{AddressSpace, SchedInfo, ThreadBuilder, ThreadId, ThreadState};

// Memory management
pub use mem::{Stack, StackSizeClass};

// Time
pub use time::{Tick, TickCounter};

// Errors
pub use errors::{ConfigError, MemoryError, ScheduleError, SpawnError, ThreadError, ThreadResult};
