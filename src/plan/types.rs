//! Plan value types.

use super::naming::Namespace;
use super::PlanError;
use serde::Serialize;
use std::collections::HashSet;

/// A router identity and its position in the experiment's router sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Router {
    pub name: String,
    pub index: usize,
}

/// Immutable experiment parameters.
///
/// `per_node_total` is always derived as `per_node * cycle`.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentPlan {
    namespace: Namespace,
    routers: Vec<Router>,
    per_node: usize,
    cycle: usize,
    second_phase_count: usize,
    designated: usize,
    per_node_total: usize,
    required: usize,
}

impl ExperimentPlan {
    /// Build a plan. The designated router defaults to the first router.
    pub fn new(
        namespace: Namespace,
        router_names: &[String],
        per_node: usize,
        cycle: usize,
        second_phase_count: usize,
        designated_router: Option<&str>,
    ) -> Result<Self, PlanError> {
        if router_names.is_empty() {
            return Err(PlanError::NoRouters);
        }

        let mut seen = HashSet::new();
        for name in router_names {
            if !seen.insert(name.as_str()) {
                return Err(PlanError::DuplicateRouter(name.clone()));
            }
        }

        let routers: Vec<Router> = router_names
            .iter()
            .enumerate()
            .map(|(index, name)| Router {
                name: name.clone(),
                index,
            })
            .collect();

        let designated = match designated_router {
            Some(name) => routers
                .iter()
                .position(|r| r.name == name)
                .ok_or_else(|| PlanError::UnknownDesignatedRouter(name.to_string()))?,
            None => 0,
        };

        let per_node_total = per_node.checked_mul(cycle);
        let required = per_node_total
            .and_then(|total| total.checked_mul(routers.len()))
            .and_then(|total| total.checked_add(second_phase_count));
        let (per_node_total, required) = match (per_node_total, required) {
            (Some(per_node_total), Some(required)) => (per_node_total, required),
            _ => {
                return Err(PlanError::PlanTooLarge {
                    routers: routers.len(),
                    per_node,
                    cycle,
                    second_phase_count,
                })
            }
        };

        Ok(Self {
            namespace,
            routers,
            per_node,
            cycle,
            second_phase_count,
            designated,
            per_node_total,
            required,
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    pub fn per_node(&self) -> usize {
        self.per_node
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn per_node_total(&self) -> usize {
        self.per_node_total
    }

    pub fn second_phase_count(&self) -> usize {
        self.second_phase_count
    }

    /// Router through which the second phase is published
    pub fn designated_router(&self) -> &Router {
        &self.routers[self.designated]
    }

    /// Minimum pool length this plan consumes
    pub fn required_prefixes(&self) -> usize {
        self.required
    }
}
