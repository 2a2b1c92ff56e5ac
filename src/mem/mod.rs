//! Kernel stacks owned by thread records.

pub mod stack;

pub use stack::{Stack, StackSizeClass, STACK_CANARY};
