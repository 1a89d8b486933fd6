//! Experiment sequencing.
//!
//! Ties allocation, injection, monitoring and reporting together into one
//! run: every cycle is injected and checked in turn, then the optional
//! cumulative check, then the second phase through the designated router.

pub mod context;
pub mod runner;

pub use context::ExperimentContext;
pub use runner::{build_allocator, check_phase, prepare_environment, Experiment};
