//! Prefix injection.
//!
//! Publishes each assigned prefix as `namespace/router/prefix`, one command
//! at a time, pausing between commands. Publishing is fire-and-forget: a
//! returned command only means the request was handed to the router, which
//! is why every batch is followed by a settle delay and a convergence check.

use crate::monitor::Phase;
use crate::network::RouterControl;
use crate::plan::Namespace;
use crate::pool::Prefix;
use crate::settle::{Clock, SettlePolicy};
use rayon::prelude::*;
use serde::Serialize;

/// Outcome counts of one or more injection batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectionSummary {
    pub published: usize,
    pub failed: usize,
    pub skipped_routers: Vec<String>,
}

impl InjectionSummary {
    fn merge(mut self, other: InjectionSummary) -> Self {
        self.published += other.published;
        self.failed += other.failed;
        self.skipped_routers.extend(other.skipped_routers);
        self
    }
}

pub struct Injector<'a> {
    network: &'a dyn RouterControl,
    settle: &'a dyn SettlePolicy,
    clock: &'a dyn Clock,
    namespace: &'a Namespace,
    parallel: bool,
}

impl<'a> Injector<'a> {
    pub fn new(
        network: &'a dyn RouterControl,
        settle: &'a dyn SettlePolicy,
        clock: &'a dyn Clock,
        namespace: &'a Namespace,
        parallel: bool,
    ) -> Self {
        Self {
            network,
            settle,
            clock,
            namespace,
            parallel,
        }
    }

    /// Publish `prefixes` through `router`, in order.
    ///
    /// A router that is not part of the network is skipped as a whole; a
    /// failing command is logged and the remaining prefixes are still sent.
    pub fn inject(&self, phase: &Phase, router: &str, prefixes: &[Prefix]) -> InjectionSummary {
        let mut summary = InjectionSummary::default();

        if prefixes.is_empty() {
            return summary;
        }

        if !self.network.has_host(router) {
            log::warn!("[{}] Node not found: {}, skipping {} prefixes", phase, router, prefixes.len());
            summary.failed = prefixes.len();
            summary.skipped_routers.push(router.to_string());
            return summary;
        }

        for prefix in prefixes {
            let name = self.namespace.full_name(router, prefix);
            match self.network.publish(router, &name) {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    log::warn!("[{}] Failed to publish {} on {}: {}", phase, name, router, e);
                    summary.failed += 1;
                }
            }
            self.settle.between_items(phase, self.clock);
        }

        summary
    }

    /// Publish one batch per router.
    ///
    /// In parallel mode each router's batch runs on its own worker; the call
    /// returns only after every batch has finished.
    pub fn inject_batch(&self, phase: &Phase, assignments: &[(&str, &[Prefix])]) -> InjectionSummary {
        log::info!(">>> Starting {} injection ({} routers)", phase, assignments.len());

        let summary = if self.parallel {
            assignments
                .par_iter()
                .map(|(router, prefixes)| self.inject(phase, router, prefixes))
                .reduce(InjectionSummary::default, InjectionSummary::merge)
        } else {
            assignments
                .iter()
                .map(|(router, prefixes)| self.inject(phase, router, prefixes))
                .fold(InjectionSummary::default(), InjectionSummary::merge)
        };

        log::info!(
            "{} injection done: {} published, {} failed",
            phase,
            summary.published,
            summary.failed
        );
        summary
    }
}
