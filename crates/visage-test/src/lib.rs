//! Visage Test Harness - Deterministic simulation and scenario validation
//!
//! This crate provides:
//! - A frame simulator driven by a manual clock
//! - Scripted input timelines delivered through the avatar mailboxes
//! - Randomized state fuzzing against the output invariants
//! - End-to-end scenarios

pub mod simulator;
pub mod state_fuzzer;
pub mod integration;

pub use simulator::*;
pub use state_fuzzer::*;
pub use integration::*;
