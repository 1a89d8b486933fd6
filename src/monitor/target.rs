//! Convergence targets: the full names a phase expects on every router.

use super::phase::Phase;
use crate::plan::{ExperimentPlan, PlanError, PrefixAllocator};
use crate::pool::{load_pool, PoolError, SourceFormat};
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergenceTarget {
    phase: Phase,
    names: Vec<String>,
}

impl ConvergenceTarget {
    pub fn new(phase: Phase, names: Vec<String>) -> Self {
        Self { phase, names }
    }

    /// Build the target of `phase` from an allocator
    pub fn for_phase(alloc: &PrefixAllocator, phase: Phase) -> Result<Self, PlanError> {
        match phase {
            Phase::AllCycles => Ok(Self::all_cycles(alloc)),
            Phase::Cycle(c) => Self::cycle(alloc, c),
            Phase::SecondPhase => Ok(Self::second_phase(alloc)),
        }
    }

    /// `namespace/r/prefix` for every router `r` and every prefix of all its cycles
    pub fn all_cycles(alloc: &PrefixAllocator) -> Self {
        let plan = alloc.plan();
        let mut names = Vec::with_capacity(plan.routers().len() * plan.per_node_total());
        for router in plan.routers() {
            // Indices come from the plan itself, so they are always in range
            if let Ok(slice) = alloc.assign_all_cycles(router.index) {
                names.extend(slice.iter().map(|p| plan.namespace().full_name(&router.name, p)));
            }
        }
        Self::new(Phase::AllCycles, names)
    }

    /// `namespace/r/prefix` for every router `r` and every prefix of cycle `cycle_index`
    pub fn cycle(alloc: &PrefixAllocator, cycle_index: usize) -> Result<Self, PlanError> {
        let plan = alloc.plan();
        let mut names = Vec::with_capacity(plan.routers().len() * plan.per_node());
        for (router, slice) in alloc.cycle_assignments(cycle_index)? {
            names.extend(slice.iter().map(|p| plan.namespace().full_name(&router.name, p)));
        }
        Ok(Self::new(Phase::Cycle(cycle_index), names))
    }

    /// Second-phase names, always rooted at the designated router
    pub fn second_phase(alloc: &PrefixAllocator) -> Self {
        let plan = alloc.plan();
        let designated = &plan.designated_router().name;
        let names = alloc
            .assign_second_phase()
            .iter()
            .map(|p| plan.namespace().full_name(designated, p))
            .collect();
        Self::new(Phase::SecondPhase, names)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Errors resolving a target at poll time
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Supplies the target for each poll tick
pub trait TargetSource: Sync {
    fn phase(&self) -> Phase;

    fn resolve(&self) -> Result<Cow<'_, ConvergenceTarget>, TargetError>;
}

impl TargetSource for ConvergenceTarget {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn resolve(&self) -> Result<Cow<'_, ConvergenceTarget>, TargetError> {
        Ok(Cow::Borrowed(self))
    }
}

/// Target rebuilt from the pool source on every tick.
///
/// A source that disappears or shrinks mid-run makes that tick fail instead
/// of aborting the run; the deadline then decides the outcome.
#[derive(Debug, Clone)]
pub struct ReloadingTarget {
    plan: ExperimentPlan,
    source: PathBuf,
    format: Option<SourceFormat>,
    phase: Phase,
}

impl ReloadingTarget {
    pub fn new(plan: ExperimentPlan, source: PathBuf, format: Option<SourceFormat>, phase: Phase) -> Self {
        Self {
            plan,
            source,
            format,
            phase,
        }
    }
}

impl TargetSource for ReloadingTarget {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn resolve(&self) -> Result<Cow<'_, ConvergenceTarget>, TargetError> {
        let pool = load_pool(&self.source, self.format)?;
        let alloc = PrefixAllocator::new(self.plan.clone(), pool)?;
        Ok(Cow::Owned(ConvergenceTarget::for_phase(&alloc, self.phase)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Namespace;
    use crate::pool::{Prefix, PrefixPool};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn plan() -> ExperimentPlan {
        let routers = vec!["a".to_string(), "b".to_string()];
        ExperimentPlan::new(Namespace::new("/minindn"), &routers, 2, 2, 3, None).unwrap()
    }

    fn alloc() -> PrefixAllocator {
        let entries = (0..11).map(|i| Prefix::parse(&format!("p{}", i)).unwrap()).collect();
        PrefixAllocator::new(plan(), PrefixPool::new(entries, "memory")).unwrap()
    }

    #[test]
    fn test_cycle_target() {
        let target = ConvergenceTarget::cycle(&alloc(), 0).unwrap();
        assert_eq!(target.phase(), Phase::Cycle(0));
        assert_eq!(
            target.names(),
            &["/minindn/a/p0", "/minindn/a/p1", "/minindn/b/p4", "/minindn/b/p5"]
        );
    }

    #[test]
    fn test_all_cycles_target() {
        let target = ConvergenceTarget::all_cycles(&alloc());
        assert_eq!(target.names().len(), 8);
        assert!(target.names().contains(&"/minindn/a/p3".to_string()));
        assert!(target.names().contains(&"/minindn/b/p7".to_string()));
        assert!(!target.names().iter().any(|n| n.ends_with("/p8")));
    }

    #[test]
    fn test_second_phase_rooted_at_designated_router() {
        let target = ConvergenceTarget::second_phase(&alloc());
        assert_eq!(target.names(), &["/minindn/a/p8", "/minindn/a/p9", "/minindn/a/p10"]);

        let routers = vec!["a".to_string(), "b".to_string()];
        let plan_b = ExperimentPlan::new(Namespace::new("/minindn"), &routers, 2, 2, 3, Some("b")).unwrap();
        let entries = (0..11).map(|i| Prefix::parse(&format!("p{}", i)).unwrap()).collect();
        let alloc_b = PrefixAllocator::new(plan_b, PrefixPool::new(entries, "memory")).unwrap();
        let target = ConvergenceTarget::second_phase(&alloc_b);
        assert_eq!(target.names(), &["/minindn/b/p8", "/minindn/b/p9", "/minindn/b/p10"]);
    }

    #[test]
    fn test_reloading_target() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..11 {
            writeln!(file, "/p{}", i).unwrap();
        }
        let source = ReloadingTarget::new(plan(), file.path().to_path_buf(), None, Phase::Cycle(1));
        let target = source.resolve().unwrap();
        assert_eq!(
            target.names(),
            &["/minindn/a/p2", "/minindn/a/p3", "/minindn/b/p6", "/minindn/b/p7"]
        );

        let missing = ReloadingTarget::new(plan(), PathBuf::from("/nonexistent/pool.csv"), None, Phase::SecondPhase);
        assert!(matches!(missing.resolve(), Err(TargetError::Pool(PoolError::SourceNotFound { .. }))));
    }
}
