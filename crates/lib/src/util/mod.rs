//! Shared utilities.
//!
//! Hashing for change detection, child-process invocation, and test helpers.

pub mod hash;
pub mod process;

#[cfg(test)]
pub mod testutil;
