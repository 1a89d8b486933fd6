//! Run reporting.
//!
//! Two outputs come out of a run: the consolidated result log, a plain-text
//! append-only file holding every router's advertisement log after each
//! convergence milestone, and an optional JSON summary of every phase.

pub mod advert_log;
pub mod summary;

pub use advert_log::{write_missing_report, AdvertLogCollector, ResultLog, NO_LOG_MARKER};
pub use summary::{Outcome, PhaseReport, RunSummary};
