//! # dvconverge - prefix injection and convergence checks for routing experiments
//!
//! This library drives experiments against an emulated network of routers
//! running a distance-vector routing protocol. It partitions a pool of name
//! prefixes across routers and cycles, publishes each cycle's prefixes,
//! and then verifies that every router's route table has learned every
//! published name before a deadline.
//!
//! ## Architecture
//!
//! - `config`: Typed YAML experiment configuration and validation
//! - `config_loader`: Configuration file loading and CLI overrides
//! - `pool`: Prefix pool loading from line or CSV sources
//! - `plan`: Experiment plan, full-name construction and prefix allocation
//! - `network`: The `RouterControl` boundary, its shell implementation and route table parsing
//! - `inject`: Rate-limited publishing of assigned prefixes
//! - `settle`: Clock and settle policy used for every wait
//! - `monitor`: Convergence targets and the polling monitor
//! - `report`: Advertisement log collection and the JSON run summary
//! - `experiment`: Phase sequencing, per-run context and teardown
//! - `utils`: Payload generation and command templates
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dvconverge::config_loader;
//! use dvconverge::experiment::{Experiment, ExperimentContext};
//! use dvconverge::network::ShellNetwork;
//! use dvconverge::settle::{FixedDelays, SystemClock};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("experiment.yaml"))?;
//! let network = ShellNetwork::new(
//!     config.hosts(),
//!     config.network.clone(),
//!     ExperimentContext::from_config(&config),
//! );
//! let clock = SystemClock::new();
//! let settle = FixedDelays::from_timing(&config.timing);
//!
//! let summary = Experiment::new(&config, &network, &clock, &settle).run()?;
//! for (phase, secs) in summary.elapsed_by_phase() {
//!     println!("{}: converged in {} seconds", phase, secs);
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Each concern has its own `thiserror` enum. Application-level functions
//! return `color_eyre::Result` with context attached.

pub mod config;
pub mod config_loader;
pub mod experiment;
pub mod inject;
pub mod monitor;
pub mod network;
pub mod plan;
pub mod pool;
pub mod report;
pub mod settle;
pub mod utils;
