//! Startup configuration handed over by the batch loader.
//!
//! Parsing the batch file is the loader's job. What arrives here is
//! already structured: the policy selector and the ordered list of
//! programs to seed, each with the priority offset it asked for.

use crate::errors::ConfigError;
use crate::sched::PolicyKind;

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

/// Static priority baseline shared by every thread.
pub const BASE_PRIORITY: i32 = 50;

/// Priority offset used when a batch entry does not name one.
pub const DEFAULT_PRIORITY_OFFSET: i32 = 100;

/// Maximum number of thread records the registry will hold.
pub const MAX_THREADS: usize = 1024;

/// Name given to the thread the kernel boots on.
pub const BOOTSTRAP_NAME: &str = "main";

/// Effective starting priority for a thread that requested `offset`.
pub fn priority_for(offset: i32) -> Result<i32, ConfigError> {
    BASE_PRIORITY
        .checked_add(offset)
        .ok_or(ConfigError::PriorityOverflow {
            base: BASE_PRIORITY,
            offset,
        })
}

/// One program to start at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Executable name, passed back to the loader and used as thread name
    pub program: String,
    /// Requested priority offset, added to [`BASE_PRIORITY`]
    pub priority_offset: i32,
}

impl BatchJob {
    /// A job with the default priority offset.
    pub fn new<T: Into<String>>(program: T) -> Self {
        Self {
            program: program.into(),
            priority_offset: DEFAULT_PRIORITY_OFFSET,
        }
    }

    /// Override the priority offset.
    pub fn with_priority_offset(mut self, offset: i32) -> Self {
        self.priority_offset = offset;
        self
    }
}

/// Everything the batch loader decides before the first thread runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Policy used for the lifetime of the kernel
    pub policy: PolicyKind,
    /// Programs to seed, in batch order
    pub jobs: Vec<BatchJob>,
}

impl BatchConfig {
    /// Build a configuration from the raw policy selector of a batch file.
    pub fn from_selector(selector: i32, jobs: Vec<BatchJob>) -> Result<Self, ConfigError> {
        let policy = PolicyKind::from_selector(selector)?;
        Ok(Self { policy, jobs })
    }

    /// Check every job's priority before anything is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for job in &self.jobs {
            priority_for(job.priority_offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_priority_for() {
        assert_eq!(priority_for(DEFAULT_PRIORITY_OFFSET), Ok(150));
        assert_eq!(priority_for(-20), Ok(30));
        assert_eq!(
            priority_for(i32::MAX),
            Err(ConfigError::PriorityOverflow {
                base: BASE_PRIORITY,
                offset: i32::MAX
            })
        );
    }

    #[test]
    fn test_batch_config_from_selector() {
        let config = BatchConfig::from_selector(2, vec![BatchJob::new("matmult")]).unwrap();
        assert_eq!(config.policy, PolicyKind::ShortestBurst);
        assert_eq!(config.jobs[0].priority_offset, DEFAULT_PRIORITY_OFFSET);

        assert_eq!(
            BatchConfig::from_selector(11, vec![]),
            Err(ConfigError::UnknownPolicy(11))
        );
    }

    #[test]
    fn test_validate_rejects_overflow() {
        let config = BatchConfig {
            policy: PolicyKind::Fifo,
            jobs: vec![
                BatchJob::new("sort"),
                BatchJob::new("halt").with_priority_offset(i32::MAX),
            ],
        };
        assert!(config.validate().is_err());
    }
}
