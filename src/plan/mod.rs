//! Experiment plan and prefix allocation.
//!
//! The plan fixes how many prefixes each router receives per cycle and how
//! many extra prefixes are published through the designated router after the
//! last cycle. The allocator turns the plan plus a loaded pool into
//! deterministic, disjoint, index-contiguous slices.

pub mod allocator;
pub mod naming;
pub mod types;

pub use allocator::PrefixAllocator;
pub use naming::Namespace;
pub use types::{ExperimentPlan, Router};

/// Errors raised while building a plan or asking it for a slice
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Prefix pool has {available} entries but the plan needs at least {required}")]
    InsufficientPrefixes { required: usize, available: usize },

    #[error(
        "Plan of {routers} routers x {per_node} prefixes x {cycle} cycles + {second_phase_count} needs more prefixes than can be addressed"
    )]
    PlanTooLarge {
        routers: usize,
        per_node: usize,
        cycle: usize,
        second_phase_count: usize,
    },

    #[error("Plan has no routers")]
    NoRouters,

    #[error("Router '{0}' appears more than once in the router sequence")]
    DuplicateRouter(String),

    #[error("Designated router '{0}' is not part of the router sequence")]
    UnknownDesignatedRouter(String),

    #[error("Router index {index} out of range ({count} routers)")]
    RouterIndexOutOfRange { index: usize, count: usize },

    #[error("Cycle index {index} out of range ({count} cycles)")]
    CycleIndexOutOfRange { index: usize, count: usize },
}
