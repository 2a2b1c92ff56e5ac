//! Crate-level tests that exercise the kernel through a recording architecture.

mod helpers;
