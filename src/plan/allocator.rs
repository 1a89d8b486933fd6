//! Deterministic mapping from (router, cycle) to a slice of the pool.
//!
//! Layout of the consumed pool prefix, for `R` routers:
//!
//! ```text
//! | router 0: cycle 0 .. cycle C-1 | router 1: ... | ... | router R-1 | second phase |
//!   <-------- per_node_total ----->
//! ```
//!
//! The length check happens once in [`PrefixAllocator::new`]; every accessor
//! afterwards is a pure slice of the pool.

use super::types::{ExperimentPlan, Router};
use super::PlanError;
use crate::pool::{Prefix, PrefixPool};

#[derive(Debug, Clone)]
pub struct PrefixAllocator {
    plan: ExperimentPlan,
    pool: PrefixPool,
}

impl PrefixAllocator {
    /// Bind a plan to a pool, failing if the pool is too short for the plan
    pub fn new(plan: ExperimentPlan, pool: PrefixPool) -> Result<Self, PlanError> {
        let required = plan.required_prefixes();
        if pool.len() < required {
            return Err(PlanError::InsufficientPrefixes {
                required,
                available: pool.len(),
            });
        }
        if pool.len() > required {
            log::debug!(
                "Prefix pool has {} entries, plan uses the first {}",
                pool.len(),
                required
            );
        }
        Ok(Self { plan, pool })
    }

    pub fn plan(&self) -> &ExperimentPlan {
        &self.plan
    }

    pub fn pool(&self) -> &PrefixPool {
        &self.pool
    }

    /// Prefixes router `router_index` publishes in cycle `cycle_index`
    pub fn assign_cycle(&self, router_index: usize, cycle_index: usize) -> Result<&[Prefix], PlanError> {
        self.check_router(router_index)?;
        if cycle_index >= self.plan.cycle() {
            return Err(PlanError::CycleIndexOutOfRange {
                index: cycle_index,
                count: self.plan.cycle(),
            });
        }
        let start = router_index * self.plan.per_node_total() + cycle_index * self.plan.per_node();
        Ok(&self.pool.entries()[start..start + self.plan.per_node()])
    }

    /// Union of every cycle's slice for one router
    pub fn assign_all_cycles(&self, router_index: usize) -> Result<&[Prefix], PlanError> {
        self.check_router(router_index)?;
        let start = router_index * self.plan.per_node_total();
        Ok(&self.pool.entries()[start..start + self.plan.per_node_total()])
    }

    /// Extra prefixes published through the designated router after the last cycle
    pub fn assign_second_phase(&self) -> &[Prefix] {
        let start = self.plan.routers().len() * self.plan.per_node_total();
        &self.pool.entries()[start..start + self.plan.second_phase_count()]
    }

    /// Every router paired with its slice for one cycle, in router order
    pub fn cycle_assignments(&self, cycle_index: usize) -> Result<Vec<(&Router, &[Prefix])>, PlanError> {
        self.plan
            .routers()
            .iter()
            .map(|router| Ok((router, self.assign_cycle(router.index, cycle_index)?)))
            .collect()
    }

    fn check_router(&self, router_index: usize) -> Result<(), PlanError> {
        let count = self.plan.routers().len();
        if router_index >= count {
            return Err(PlanError::RouterIndexOutOfRange {
                index: router_index,
                count,
            });
        }
        Ok(())
    }
}
