//! The single owner of every live thread record.

use super::{SchedInfo, ThreadId, ThreadRecord, ThreadState};
use crate::arch::Arch;
use crate::config::MAX_THREADS;
use crate::errors::{ScheduleError, SpawnError, ThreadResult};

extern crate alloc;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;

/// Thread table keyed by [`ThreadId`].
///
/// Records are boxed so that the saved context inside each one keeps a
/// stable address while the dispatcher holds raw pointers to it across a
/// context switch. Iteration is in ascending id order.
pub struct ThreadRegistry<A: Arch> {
    threads: BTreeMap<ThreadId, Box<ThreadRecord<A>>>,
    next_id: u32,
}

impl<A: Arch> ThreadRegistry<A> {
    pub fn new() -> Self {
        Self {
            threads: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Registry holding only the record of the thread the kernel boots on.
    pub(crate) fn with_bootstrap(name: &str, base_priority: i32) -> Self {
        let mut registry = Self::new();
        let record = ThreadRecord::bootstrap(name.into(), base_priority);
        registry.threads.insert(ThreadId::BOOTSTRAP, Box::new(record));
        registry.next_id = ThreadId::BOOTSTRAP.get() + 1;
        registry
    }

    /// Reserve the next id. Fails once `MAX_THREADS` records are live.
    pub(crate) fn allocate_id(&mut self) -> Result<ThreadId, SpawnError> {
        if self.threads.len() >= MAX_THREADS {
            return Err(SpawnError::TooManyThreads);
        }
        let id = ThreadId::new(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or(SpawnError::TooManyThreads)?;
        Ok(id)
    }

    /// Take ownership of a record built for an id from [`Self::allocate_id`].
    pub(crate) fn insert(&mut self, record: ThreadRecord<A>) -> ThreadId {
        let id = record.id();
        self.threads.insert(id, Box::new(record));
        id
    }

    pub(crate) fn remove(&mut self, id: ThreadId) -> Option<Box<ThreadRecord<A>>> {
        self.threads.remove(&id)
    }

    pub fn get(&self, id: ThreadId) -> Option<&ThreadRecord<A>> {
        self.threads.get(&id).map(|record| &**record)
    }

    pub(crate) fn get_mut(&mut self, id: ThreadId) -> Option<&mut ThreadRecord<A>> {
        self.threads.get_mut(&id).map(|record| &mut **record)
    }

    /// Like [`Self::get_mut`], but reports an unknown id as an error.
    pub(crate) fn expect_mut(&mut self, id: ThreadId) -> ThreadResult<&mut ThreadRecord<A>> {
        self.get_mut(id)
            .ok_or_else(|| ScheduleError::UnknownThread(id).into())
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.threads.contains_key(&id)
    }

    pub fn sched_info(&self, id: ThreadId) -> Option<&SchedInfo> {
        self.get(id).map(ThreadRecord::info)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadRecord<A>> {
        self.threads.values().map(|record| &**record)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Number of records currently in `state`.
    pub fn count_in(&self, state: ThreadState) -> usize {
        self.iter().filter(|record| record.state() == state).count()
    }
}

impl<A: Arch> Default for ThreadRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
