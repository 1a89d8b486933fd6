//! Convergence monitoring.
//!
//! A phase is converged when every polled router's route table contains
//! every full name of that phase's target. The monitor samples route tables
//! on a fixed interval until that holds or the phase deadline passes.

pub mod convergence;
pub mod phase;
pub mod target;

pub use convergence::{Convergence, ConvergenceMonitor, RouterMisses};
pub use phase::Phase;
pub use target::{ConvergenceTarget, ReloadingTarget, TargetError, TargetSource};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("[{phase}] Routing did not converge within {deadline:?} ({ticks} ticks)")]
    ConvergenceTimeout {
        phase: Phase,
        deadline: Duration,
        ticks: u32,
    },
}
