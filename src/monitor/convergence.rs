//! Poll loop deciding Converged / TimedOut for one phase.

use super::phase::Phase;
use super::target::{ConvergenceTarget, TargetSource};
use super::MonitorError;
use crate::network::{MatchMode, RouteTable, RouterControl};
use crate::settle::Clock;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Duration;

/// Successful convergence of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Convergence {
    pub phase: Phase,
    /// Wall-clock seconds from the start of polling, rounded
    pub elapsed_secs: u64,
    pub ticks: u32,
}

/// Names one router is still missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterMisses {
    pub router: String,
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ConvergenceMonitor<'a> {
    network: &'a dyn RouterControl,
    clock: &'a dyn Clock,
    match_mode: MatchMode,
    poll_interval: Duration,
    parallel: bool,
}

impl<'a> ConvergenceMonitor<'a> {
    pub fn new(
        network: &'a dyn RouterControl,
        clock: &'a dyn Clock,
        match_mode: MatchMode,
        poll_interval: Duration,
        parallel: bool,
    ) -> Self {
        Self {
            network,
            clock,
            match_mode,
            poll_interval,
            parallel,
        }
    }

    /// Poll until every host holds every target name, or `deadline` passes.
    ///
    /// A tick whose target cannot be resolved counts as not converged.
    pub fn await_convergence(&self, source: &dyn TargetSource, deadline: Duration) -> Result<Convergence, MonitorError> {
        let phase = source.phase();
        log::info!("[{}] Waiting for routing to converge", phase);

        let start = self.clock.now();
        let mut ticks = 0u32;

        while self.clock.now().saturating_sub(start) < deadline {
            self.clock.sleep(self.poll_interval);
            ticks += 1;

            let target = match source.resolve() {
                Ok(target) => target,
                Err(e) => {
                    log::warn!("[{}] Convergence target unavailable: {}", phase, e);
                    continue;
                }
            };

            if self.is_converged(&target) {
                let elapsed = self.clock.now().saturating_sub(start);
                let elapsed_secs = elapsed.as_secs_f64().round() as u64;
                log::info!("[{}] Routing converged in {} seconds", phase, elapsed_secs);
                return Ok(Convergence {
                    phase,
                    elapsed_secs,
                    ticks,
                });
            }
        }

        log::error!("[{}] Routing did not converge", phase);
        Err(MonitorError::ConvergenceTimeout {
            phase,
            deadline,
            ticks,
        })
    }

    /// One tick: true when no host is missing any target name.
    ///
    /// Sequential mode stops at the first host with a miss. Parallel mode
    /// queries hosts concurrently and only answers once all have reported
    /// or one has missed.
    pub fn is_converged(&self, target: &ConvergenceTarget) -> bool {
        let hosts = self.network.hosts();
        if self.parallel {
            hosts.par_iter().all(|host| self.host_converged(host, target))
        } else {
            hosts.iter().all(|host| self.host_converged(host, target))
        }
    }

    fn host_converged(&self, host: &str, target: &ConvergenceTarget) -> bool {
        let table = match self.network.route_table(host) {
            Ok(raw) => RouteTable::parse(raw),
            Err(e) => {
                log::warn!("[{}] Route query failed on {}: {}", target.phase(), host, e);
                return false;
            }
        };

        match target.names().iter().find(|name| !table.contains(name, self.match_mode)) {
            Some(name) => {
                log::info!("[{}] Routing not converged on {} for {}", target.phase(), host, name);
                false
            }
            None => true,
        }
    }

    /// Full scan of every host, listing all missing names (no short-circuit)
    pub fn missing_names(&self, target: &ConvergenceTarget) -> Vec<RouterMisses> {
        let scan = |host: &String| -> RouterMisses {
            match self.network.route_table(host) {
                Ok(raw) => {
                    let table = RouteTable::parse(raw);
                    RouterMisses {
                        router: host.clone(),
                        missing: target
                            .names()
                            .iter()
                            .filter(|name| !table.contains(name, self.match_mode))
                            .cloned()
                            .collect(),
                        error: None,
                    }
                }
                Err(e) => RouterMisses {
                    router: host.clone(),
                    missing: target.names().to_vec(),
                    error: Some(e.to_string()),
                },
            }
        };

        let hosts = self.network.hosts();
        if self.parallel {
            hosts.par_iter().map(scan).collect()
        } else {
            hosts.iter().map(scan).collect()
        }
    }
}
