//! Error types for the scheduling core.
//!
//! Every fallible operation returns a [`ThreadResult`]. The sub-enums group
//! failures by the subsystem that reports them; [`ThreadError`] wraps them so
//! callers can use `?` across module boundaries.

#![allow(clippy::uninlined_format_args)]

use core::fmt;

use crate::thread::{ThreadId, ThreadState};

/// Result type for scheduler operations.
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Umbrella error for all scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// Thread creation errors
    Spawn(SpawnError),
    /// Scheduling and dispatch errors
    Schedule(ScheduleError),
    /// Stack memory errors
    Memory(MemoryError),
    /// Startup configuration errors
    Config(ConfigError),
}

/// Errors that can occur while registering a new thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The registry already holds `MAX_THREADS` records
    TooManyThreads,
    /// The loader could not build an address space for a batch job
    LoadFailed,
}

/// Errors related to scheduling and dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No thread with this id is registered
    UnknownThread(ThreadId),
    /// The thread is in a state that does not allow the transition
    InvalidState(ThreadId, ThreadState),
    /// A finished thread is already waiting to be destroyed
    DestructionPending(ThreadId),
    /// There is no current thread to operate on
    NoCurrentThread,
}

/// Stack memory errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The allocator returned null
    OutOfMemory,
    /// The requested stack size is too small to hold the canary or not representable
    InvalidStackSize(usize),
}

/// Errors in the startup configuration handed over by the batch loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The policy selector does not name a known policy
    UnknownPolicy(i32),
    /// `base + offset` does not fit the priority type
    PriorityOverflow { base: i32, offset: i32 },
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::Spawn(e) => write!(f, "spawn error: {}", e),
            ThreadError::Schedule(e) => write!(f, "schedule error: {}", e),
            ThreadError::Memory(e) => write!(f, "memory error: {}", e),
            ThreadError::Config(e) => write!(f, "config error: {}", e),
        }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::TooManyThreads => write!(f, "thread registry is full"),
            SpawnError::LoadFailed => write!(f, "loader failed to build address space"),
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::UnknownThread(id) => write!(f, "no thread with id {}", id),
            ScheduleError::InvalidState(id, state) => {
                write!(f, "thread {} cannot make this transition from {:?}", id, state)
            }
            ScheduleError::DestructionPending(id) => {
                write!(f, "thread {} is still waiting to be destroyed", id)
            }
            ScheduleError::NoCurrentThread => write!(f, "no thread is running"),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::OutOfMemory => write!(f, "out of memory"),
            MemoryError::InvalidStackSize(size) => write!(f, "invalid stack size: {}", size),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownPolicy(id) => write!(f, "unknown scheduling policy {}", id),
            ConfigError::PriorityOverflow { base, offset } => {
                write!(f, "priority {} + {} overflows", base, offset)
            }
        }
    }
}

impl From<SpawnError> for ThreadError {
    fn from(error: SpawnError) -> Self {
        ThreadError::Spawn(error)
    }
}

impl From<ScheduleError> for ThreadError {
    fn from(error: ScheduleError) -> Self {
        ThreadError::Schedule(error)
    }
}

impl From<MemoryError> for ThreadError {
    fn from(error: MemoryError) -> Self {
        ThreadError::Memory(error)
    }
}

impl From<ConfigError> for ThreadError {
    fn from(error: ConfigError) -> Self {
        ThreadError::Config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err: ThreadError = ConfigError::UnknownPolicy(42).into();
        assert_eq!(err.to_string(), "config error: unknown scheduling policy 42");

        let err: ThreadError = ScheduleError::UnknownThread(ThreadId::new(7)).into();
        assert_eq!(err.to_string(), "schedule error: no thread with id 7");
    }

    #[test]
    fn test_error_conversion() {
        let err: ThreadError = MemoryError::OutOfMemory.into();
        assert!(matches!(err, ThreadError::Memory(MemoryError::OutOfMemory)));

        let err: ThreadError = SpawnError::TooManyThreads.into();
        assert!(matches!(err, ThreadError::Spawn(SpawnError::TooManyThreads)));
    }
}
