//! Kernel abstraction for managing the scheduling core.
//!
//! This module provides the main `Kernel` struct that owns the thread
//! registry, the ready container (through the configured policy), the
//! current-thread slot and the pending-destruction slot, and drives
//! dispatch between thread contexts.

use crate::arch::{Arch, InterruptGuard};
use crate::config::{BatchConfig, BatchJob, BASE_PRIORITY, BOOTSTRAP_NAME};
use crate::errors::{ScheduleError, SpawnError, ThreadResult};
use crate::sched::{bookkeeping, PolicyKind, SchedulingPolicy};
use crate::thread::{SchedInfo, ThreadBuilder, ThreadId, ThreadRecord, ThreadRegistry, ThreadState};
use crate::time::{Tick, TickCounter};
use core::fmt;

extern crate alloc;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Counters reported by [`Kernel::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedStats {
    /// Live thread records, including the current thread
    pub total: usize,
    /// Threads waiting in the ready container
    pub ready: usize,
    /// Threads waiting for a wake-up
    pub blocked: usize,
    /// Completed transfers between two different threads
    pub context_switches: u64,
}

/// Saved-context pointers of one transfer, taken while the lock was held.
type Transfer<A> = (*mut <A as Arch>::SavedContext, *const <A as Arch>::SavedContext);

/// Everything protected by the kernel lock.
struct SchedState<A: Arch> {
    registry: ThreadRegistry<A>,
    policy: Box<dyn SchedulingPolicy>,
    kind: PolicyKind,
    /// The thread whose context is live on the CPU. Only `dispatch` changes it.
    current: Option<ThreadId>,
    /// A finished thread whose stack may still be in use
    pending_destruction: Option<Box<ThreadRecord<A>>>,
    context_switches: u64,
}

impl<A: Arch> SchedState<A> {
    fn new(kind: PolicyKind) -> Self {
        Self {
            registry: ThreadRegistry::with_bootstrap(BOOTSTRAP_NAME, BASE_PRIORITY),
            policy: kind.build(),
            kind,
            current: Some(ThreadId::BOOTSTRAP),
            pending_destruction: None,
            context_switches: 0,
        }
    }

    fn current_id(&self) -> ThreadResult<ThreadId> {
        self.current.ok_or_else(|| ScheduleError::NoCurrentThread.into())
    }

    /// Stamp the READY transition and hand the id to the policy.
    fn enqueue_ready(&mut self, id: ThreadId, now: Tick) -> ThreadResult<()> {
        let record = self.registry.expect_mut(id)?;
        let bootstrap = record.is_bootstrap();
        bookkeeping::mark_ready(&mut record.info, now, bootstrap);
        log::debug!("Putting thread \"{}\" with pid {} on ready list", record.name(), id);
        self.policy.enqueue(id);
        Ok(())
    }

    fn pick(&mut self) -> Option<ThreadId> {
        let Self { registry, policy, .. } = self;
        policy.pick_next(&*registry)
    }

    /// Close the running burst of `id`. Fails unless it is RUNNING.
    fn leave_running(&mut self, id: ThreadId, now: Tick) -> ThreadResult<Tick> {
        let recompute = self.kind.recomputes_priority();
        let record = self.registry.expect_mut(id)?;
        if record.state() != ThreadState::Running {
            return Err(ScheduleError::InvalidState(id, record.state()).into());
        }
        let recompute = recompute && !record.is_bootstrap();
        Ok(bookkeeping::end_burst(&mut record.info, now, recompute))
    }

    /// Move the finished record of `id` into the pending-destruction slot.
    fn retire(&mut self, id: ThreadId) -> ThreadResult<()> {
        if let Some(pending) = &self.pending_destruction {
            return Err(ScheduleError::DestructionPending(pending.id()).into());
        }
        let mut record = self
            .registry
            .remove(id)
            .ok_or(ScheduleError::UnknownThread(id))?;
        record.info.state = ThreadState::Finished;
        log::debug!("Finishing thread \"{}\" with pid {}", record.name(), id);
        self.pending_destruction = Some(record);
        Ok(())
    }

    /// Everything `dispatch` does before the transfer.
    ///
    /// Returns `None` when `next` is already the current thread.
    fn prepare_switch(&mut self, next: ThreadId, now: Tick) -> ThreadResult<Option<Transfer<A>>> {
        let old = self.current_id()?;

        let next_state = self
            .registry
            .get(next)
            .map(ThreadRecord::state)
            .ok_or(ScheduleError::UnknownThread(next))?;
        if next_state != ThreadState::Ready || self.policy.contains(next) {
            return Err(ScheduleError::InvalidState(next, next_state).into());
        }

        // A finishing thread has already moved to the pending slot.
        let old_record = if self.registry.contains(old) {
            self.registry.get_mut(old)
        } else {
            self.pending_destruction
                .as_deref_mut()
                .filter(|record| record.id() == old)
        }
        .ok_or(ScheduleError::NoCurrentThread)?;

        if old_record.state() == ThreadState::Running {
            return Err(ScheduleError::InvalidState(old, ThreadState::Running).into());
        }

        if let Some(space) = old_record.address_space_mut() {
            space.save_user_state();
            space.save_switch_state();
        }

        if !old_record.check_stack_integrity() {
            log::error!(
                "Stack overflow detected in thread \"{}\" with pid {}",
                old_record.name(),
                old
            );
            panic!("stack overflow in thread {}", old);
        }

        let old_name = String::from(old_record.name());
        let prev = old_record.context_ptr();

        let next_record = self.registry.expect_mut(next)?;
        bookkeeping::begin_burst(&mut next_record.info, now);
        log::debug!(
            "Switching from thread \"{}\" to thread \"{}\"",
            old_name,
            next_record.name()
        );
        let next_ctx = next_record.context_ptr() as *const A::SavedContext;
        self.current = Some(next);

        if old == next {
            return Ok(None);
        }
        self.context_switches += 1;
        Ok(Some((prev, next_ctx)))
    }
}

/// Main kernel handle that manages the scheduling core.
///
/// The kernel starts out running on the bootstrap thread (id 0). Every
/// public operation runs with interrupts disabled; the internal lock is
/// never held across a context transfer.
///
/// # Type Parameters
///
/// * `A` - Architecture implementation
pub struct Kernel<A: Arch> {
    state: spin::Mutex<SchedState<A>>,
    clock: TickCounter,
}

impl<A: Arch> Kernel<A> {
    /// Create a kernel using `kind` for its whole lifetime.
    pub fn new(kind: PolicyKind) -> Self {
        let state = SchedState::new(kind);
        log::info!("Scheduling policy: {}", state.policy.name());
        Self {
            state: spin::Mutex::new(state),
            clock: TickCounter::new(),
        }
    }

    /// Create a kernel for the policy chosen by a batch configuration.
    ///
    /// The jobs themselves are started with [`Self::seed_batch`].
    pub fn for_batch(config: &BatchConfig) -> Self {
        Self::new(config.policy)
    }

    /// The configured policy.
    pub fn policy(&self) -> PolicyKind {
        self.state.lock().kind
    }

    /// The tick counter, advanced by the timer and read by every transition.
    pub fn clock(&self) -> &TickCounter {
        &self.clock
    }

    /// Id of the thread whose context is live on the CPU.
    pub fn current(&self) -> Option<ThreadId> {
        self.state.lock().current
    }

    /// Snapshot of a live thread's scheduling metrics.
    pub fn thread_info(&self, id: ThreadId) -> Option<SchedInfo> {
        self.state.lock().registry.sched_info(id).cloned()
    }

    /// Name of a live thread.
    pub fn thread_name(&self, id: ThreadId) -> Option<String> {
        self.state.lock().registry.get(id).map(|record| record.name().into())
    }

    /// Run `f` on a live thread's record with the lock held.
    ///
    /// `f` runs with interrupts disabled and must not call back into the kernel.
    pub fn with_thread<R, F>(&self, id: ThreadId, f: F) -> Option<R>
    where
        F: FnOnce(&ThreadRecord<A>) -> R,
    {
        let _guard = InterruptGuard::<A>::new();
        self.state.lock().registry.get(id).map(f)
    }

    /// Whether a finished thread is waiting to be destroyed.
    pub fn destruction_pending(&self) -> bool {
        self.state.lock().pending_destruction.is_some()
    }

    /// Register a new thread. It stays NEW until passed to [`Self::mark_ready`].
    pub fn spawn(&self, builder: ThreadBuilder) -> ThreadResult<ThreadId> {
        let _guard = InterruptGuard::<A>::new();
        let mut state = self.state.lock();
        let id = state.registry.allocate_id()?;
        let record = builder.build::<A>(id)?;
        log::debug!("Created thread \"{}\" with pid {}", record.name(), id);
        Ok(state.registry.insert(record))
    }

    /// Start every job of a batch, in batch order.
    ///
    /// For each job the kernel prepares a builder carrying the program name
    /// and priority offset; `loader` attaches the address space (and entry
    /// point, if any) or returns `None` when the program cannot be loaded.
    /// Each spawned thread is marked ready immediately.
    pub fn seed_batch<F>(&self, config: &BatchConfig, mut loader: F) -> ThreadResult<Vec<ThreadId>>
    where
        F: FnMut(&BatchJob, ThreadBuilder) -> Option<ThreadBuilder>,
    {
        config.validate()?;
        if config.policy != self.policy() {
            log::warn!(
                "Batch asks for {:?} but the kernel runs {:?}",
                config.policy,
                self.policy()
            );
        }

        let mut ids = Vec::with_capacity(config.jobs.len());
        for job in &config.jobs {
            let builder = ThreadBuilder::new(job.program.as_str()).priority_offset(job.priority_offset);
            let builder = loader(job, builder).ok_or(SpawnError::LoadFailed)?;
            let id = self.spawn(builder)?;
            self.mark_ready(id)?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Make a NEW or BLOCKED thread ready to run.
    ///
    /// This is the entry point for the wake-up path (timer, I/O completion,
    /// synchronization primitives). It never blocks.
    pub fn mark_ready(&self, id: ThreadId) -> ThreadResult<()> {
        let _guard = InterruptGuard::<A>::new();
        let now = self.clock.now();
        let mut state = self.state.lock();

        let status = state
            .registry
            .get(id)
            .map(ThreadRecord::state)
            .ok_or(ScheduleError::UnknownThread(id))?;
        match status {
            ThreadState::New | ThreadState::Blocked => state.enqueue_ready(id, now),
            other => Err(ScheduleError::InvalidState(id, other).into()),
        }
    }

    /// Remove and return the thread the policy wants to run next.
    ///
    /// `None` means nothing is ready and the caller should idle.
    pub fn select_next(&self) -> Option<ThreadId> {
        let _guard = InterruptGuard::<A>::new();
        self.state.lock().pick()
    }

    /// Transfer the CPU from the current thread to `next`.
    ///
    /// The current thread must already have left RUNNING (ready, blocked or
    /// finished) and `next` must have come from [`Self::select_next`].
    /// From the caller's point of view this returns once some later
    /// dispatch switches back to it.
    ///
    /// # Panics
    ///
    /// Panics if the outgoing thread has overflowed its stack.
    pub fn dispatch(&self, next: ThreadId) -> ThreadResult<()> {
        let _guard = InterruptGuard::<A>::new();
        let now = self.clock.now();
        let transfer = self.state.lock().prepare_switch(next, now)?;

        if let Some((prev, next)) = transfer {
            // SAFETY: both contexts live in boxed records; the outgoing one
            // is only freed by `schedule_tail` after this call, and the lock
            // has been released.
            unsafe { A::context_switch(prev, next) };
        }

        self.schedule_tail();
        Ok(())
    }

    /// Second half of a dispatch, run by whichever thread now owns the CPU.
    ///
    /// Frees the pending finished thread, then restores the current thread's
    /// user state. A new thread's entry function must call this before
    /// anything else, since its first run does not return through
    /// [`Self::dispatch`]. Interrupts are still masked at that point and
    /// stay masked until the entry function enables them.
    pub fn schedule_tail(&self) {
        let _guard = InterruptGuard::<A>::new();

        let doomed = self.state.lock().pending_destruction.take();
        drop(doomed);

        let mut state = self.state.lock();
        let Some(current) = state.current else {
            return;
        };
        if let Some(space) = state
            .registry
            .get_mut(current)
            .and_then(ThreadRecord::address_space_mut)
        {
            space.restore_user_state();
            space.restore_switch_state();
        }
    }

    /// Give up the CPU if another thread is ready, otherwise keep running.
    pub fn yield_current(&self) -> ThreadResult<()> {
        let _guard = InterruptGuard::<A>::new();
        let now = self.clock.now();

        let next = {
            let mut state = self.state.lock();
            let current = state.current_id()?;
            if state.policy.is_empty() {
                return Ok(());
            }
            state.leave_running(current, now)?;
            state.enqueue_ready(current, now)?;
            state.pick()
        };

        match next {
            Some(next) => self.dispatch(next),
            None => Ok(()),
        }
    }

    /// Put the current thread to sleep until someone calls [`Self::mark_ready`].
    pub fn block_current(&self) -> ThreadResult<()> {
        let _guard = InterruptGuard::<A>::new();
        let now = self.clock.now();

        {
            let mut state = self.state.lock();
            let current = state.current_id()?;
            state.leave_running(current, now)?;
            let record = state.registry.expect_mut(current)?;
            bookkeeping::mark_blocked(&mut record.info, now);
            log::debug!("Sleeping thread \"{}\" with pid {}", record.name(), current);
        }

        let next = self.select_or_idle();
        self.dispatch(next)
    }

    /// Terminate the current thread.
    ///
    /// Its record is destroyed by the next thread to run, once the CPU is
    /// no longer on the finished thread's stack.
    pub fn finish_current(&self) -> ThreadResult<()> {
        let _guard = InterruptGuard::<A>::new();
        let now = self.clock.now();

        {
            let mut state = self.state.lock();
            let current = state.current_id()?;
            if let Some(pending) = &state.pending_destruction {
                return Err(ScheduleError::DestructionPending(pending.id()).into());
            }
            state.leave_running(current, now)?;
            state.retire(current)?;
        }

        let next = self.select_or_idle();
        self.dispatch(next)
    }

    /// Select the next thread, idling with interrupts enabled while none is ready.
    fn select_or_idle(&self) -> ThreadId {
        loop {
            if let Some(next) = self.select_next() {
                return next;
            }
            A::enable_interrupts();
            A::wait_for_interrupt();
            A::disable_interrupts();
        }
    }

    /// Print the ready container, one line per thread, in container order.
    pub fn dump_ready<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let _guard = InterruptGuard::<A>::new();
        let state = self.state.lock();

        writeln!(out, "Ready list contents:")?;
        for id in state.policy.ready_ids() {
            let Some(record) = state.registry.get(id) else {
                continue;
            };
            let info = record.info();
            writeln!(
                out,
                "{} \"{}\" {:?} burst={} priority={} ready_since={}",
                id,
                record.name(),
                info.state,
                info.estimated_burst,
                info.priority,
                info.ready_since
            )?;
        }
        Ok(())
    }

    /// Ready ids in container order.
    pub fn ready_snapshot(&self) -> Vec<ThreadId> {
        let _guard = InterruptGuard::<A>::new();
        self.state.lock().policy.ready_ids()
    }

    /// Get current thread statistics.
    pub fn stats(&self) -> SchedStats {
        let _guard = InterruptGuard::<A>::new();
        let state = self.state.lock();
        SchedStats {
            total: state.registry.len(),
            ready: state.policy.len(),
            blocked: state.registry.count_in(ThreadState::Blocked),
            context_switches: state.context_switches,
        }
    }
}
