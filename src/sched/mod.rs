//! Scheduling policies and the bookkeeping they depend on.
//!
//! The policy is chosen once, from the batch selector, and never changes:
//! FIFO-ordered policies keep a queue while the burst and priority
//! policies keep a table they scan, so the two kinds of container cannot
//! be swapped under live threads.

pub mod bookkeeping;
pub mod burst;
pub mod fifo;
pub mod priority;
pub mod ready;
pub mod trait_def;

pub use burst::ShortestBurstPolicy;
pub use fifo::FifoPolicy;
pub use priority::PriorityPolicy;
pub use trait_def::{ReadyView, SchedulingPolicy};

use crate::errors::ConfigError;

extern crate alloc;
use alloc::boxed::Box;

const RR_NAMES: [&str; 4] = ["Round-Robin-1", "Round-Robin-2", "Round-Robin-3", "Round-Robin-4"];

/// The closed set of policies a kernel can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// Non-preemptive first-come first-served (selector 1)
    #[default]
    Fifo,
    /// Non-preemptive shortest estimated burst (selector 2)
    ShortestBurst,
    /// FIFO selection with one of four time slices (selectors 3-6)
    RoundRobin { variant: u8 },
    /// Priority-class selection with one of four time slices (selectors 7-10)
    Priority { variant: u8 },
}

impl PolicyKind {
    /// Decode the policy selector found at the top of a batch file.
    pub fn from_selector(selector: i32) -> Result<Self, ConfigError> {
        match selector {
            1 => Ok(PolicyKind::Fifo),
            2 => Ok(PolicyKind::ShortestBurst),
            3..=6 => Ok(PolicyKind::RoundRobin {
                variant: (selector - 3) as u8,
            }),
            7..=10 => Ok(PolicyKind::Priority {
                variant: (selector - 7) as u8,
            }),
            _ => Err(ConfigError::UnknownPolicy(selector)),
        }
    }

    /// Whether thread priorities are recomputed at the end of each burst.
    pub fn recomputes_priority(self) -> bool {
        matches!(self, PolicyKind::Priority { .. })
    }

    /// Build the policy object that owns the ready container.
    pub fn build(self) -> Box<dyn SchedulingPolicy> {
        match self {
            PolicyKind::Fifo => Box::new(FifoPolicy::new()),
            PolicyKind::ShortestBurst => Box::new(ShortestBurstPolicy::new()),
            PolicyKind::RoundRobin { variant } => {
                Box::new(FifoPolicy::named(RR_NAMES[usize::from(variant.min(3))]))
            }
            PolicyKind::Priority { variant } => Box::new(PriorityPolicy::new(variant)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_mapping() {
        assert_eq!(PolicyKind::from_selector(1), Ok(PolicyKind::Fifo));
        assert_eq!(PolicyKind::from_selector(2), Ok(PolicyKind::ShortestBurst));
        assert_eq!(
            PolicyKind::from_selector(5),
            Ok(PolicyKind::RoundRobin { variant: 2 })
        );
        assert_eq!(
            PolicyKind::from_selector(10),
            Ok(PolicyKind::Priority { variant: 3 })
        );
    }

    #[test]
    fn test_unknown_selector() {
        for bad in [0, -1, 11, i32::MAX] {
            assert_eq!(
                PolicyKind::from_selector(bad),
                Err(ConfigError::UnknownPolicy(bad))
            );
        }
    }

    #[test]
    fn test_every_selector_names_a_distinct_policy() {
        let mut names: alloc::vec::Vec<&str> = (1..=10)
            .map(|selector| PolicyKind::from_selector(selector).unwrap().build().name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_build_names() {
        assert_eq!(PolicyKind::Fifo.build().name(), "FIFO");
        assert_eq!(PolicyKind::ShortestBurst.build().name(), "Shortest-Burst");
        assert_eq!(PolicyKind::RoundRobin { variant: 0 }.build().name(), "Round-Robin-1");
        assert_eq!(PolicyKind::Priority { variant: 1 }.build().name(), "Priority-2");
    }

    #[test]
    fn test_only_priority_policies_recompute() {
        assert!(PolicyKind::Priority { variant: 0 }.recomputes_priority());
        assert!(!PolicyKind::ShortestBurst.recomputes_priority());
        assert!(!PolicyKind::Fifo.recomputes_priority());
    }
}
