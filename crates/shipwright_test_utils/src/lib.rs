//! # Shipwright Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Standard block catalog and ship fixtures
//! - A recording physics world that integrates forces deterministically
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod physics;

/// Re-export proptest for convenience.
pub use proptest;
