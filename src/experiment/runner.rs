use crate::config::Config;
use crate::inject::{InjectionSummary, Injector};
use crate::monitor::{ConvergenceMonitor, ConvergenceTarget, MonitorError, Phase, ReloadingTarget, RouterMisses, TargetSource};
use crate::network::RouterControl;
use crate::plan::{ExperimentPlan, Namespace, PrefixAllocator};
use crate::pool::{load_pool, Prefix};
use crate::report::{write_missing_report, AdvertLogCollector, Outcome, PhaseReport, ResultLog, RunSummary};
use crate::settle::{Clock, SettlePolicy};
use crate::utils::ensure_payload;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::fs;

/// Load the pool and partition it. Fails before any network action.
pub fn build_allocator(config: &Config) -> Result<PrefixAllocator> {
    let pool = load_pool(&config.plan.source, config.plan.format)?;
    log::info!("Loaded {} prefixes from {:?}", pool.len(), pool.source());

    let plan = ExperimentPlan::new(
        Namespace::new(&config.general.namespace),
        &config.plan.routers,
        config.plan.per_node,
        config.plan.cycle,
        config.plan.second_phase_count,
        config.plan.designated_router.as_deref(),
    )?;

    let alloc = PrefixAllocator::new(plan, pool)?;
    Ok(alloc)
}

/// Remove stale router logs and create the publish payload
pub fn prepare_environment(config: &Config) -> Result<()> {
    for dir in &config.general.clear_dirs {
        if dir.exists() {
            fs::remove_dir_all(dir).wrap_err_with(|| format!("Failed to clear directory '{}'", dir.display()))?;
            log::info!("Cleared {:?}", dir);
        }
    }

    ensure_payload(&config.network.payload)?;
    Ok(())
}

/// One tick against live route tables: what each host is still missing
pub fn check_phase(config: &Config, network: &dyn RouterControl, clock: &dyn Clock, phase: Phase) -> Result<Vec<RouterMisses>> {
    let alloc = build_allocator(config)?;
    let target = ConvergenceTarget::for_phase(&alloc, phase)?;
    let monitor = ConvergenceMonitor::new(
        network,
        clock,
        config.monitor.match_mode,
        config.timing.poll_interval,
        config.timing.parallel,
    );
    Ok(monitor.missing_names(&target))
}

/// A full run against one network
pub struct Experiment<'a> {
    config: &'a Config,
    network: &'a dyn RouterControl,
    clock: &'a dyn Clock,
    settle: &'a dyn SettlePolicy,
}

impl<'a> Experiment<'a> {
    pub fn new(config: &'a Config, network: &'a dyn RouterControl, clock: &'a dyn Clock, settle: &'a dyn SettlePolicy) -> Self {
        Self {
            config,
            network,
            clock,
            settle,
        }
    }

    /// Run every phase, then tear the network down whatever happened.
    ///
    /// The network is torn down even when the pool or plan is rejected, since
    /// the routers were started before the run began. A phase that does not converge ends the run with its
    /// [`MonitorError`]; the result log and the JSON summary still hold
    /// everything gathered up to that point.
    pub fn run(&self) -> Result<RunSummary> {
        let result_log = ResultLog::new(&self.config.general.result_log);
        let prepared = build_allocator(self.config).and_then(|alloc| {
            prepare_environment(self.config)?;
            result_log.truncate()?;
            Ok(alloc)
        });
        let alloc = match prepared {
            Ok(alloc) => alloc,
            Err(e) => {
                log::info!("Tearing down network");
                self.network.teardown();
                return Err(e);
            }
        };

        let mut summary = RunSummary::new(alloc.plan().namespace().as_str(), self.network.hosts().to_vec());
        let result = self.run_phases(&alloc, &result_log, &mut summary);

        log::info!("Tearing down network");
        self.network.teardown();

        match &result {
            Ok(()) => summary.finish(Outcome::Converged),
            Err(e) => match e.downcast_ref::<MonitorError>() {
                Some(MonitorError::ConvergenceTimeout { phase, .. }) => summary.finish(Outcome::TimedOut { phase: *phase }),
                None => summary.finish(Outcome::Aborted { error: format!("{:#}", e) }),
            },
        }

        if let Some(path) = &self.config.general.summary_json {
            if let Err(e) = summary.write_json(path) {
                log::warn!("{:#}", e);
            }
        }

        result.map(|()| summary)
    }

    fn run_phases(&self, alloc: &PrefixAllocator, result_log: &ResultLog, summary: &mut RunSummary) -> Result<()> {
        let plan = alloc.plan();
        let parallel = self.config.timing.parallel;
        let injector = Injector::new(self.network, self.settle, self.clock, plan.namespace(), parallel);

        for c in 0..plan.cycle() {
            let phase = Phase::Cycle(c);
            let assignments = alloc.cycle_assignments(c)?;
            let batch: Vec<(&str, &[Prefix])> = assignments.iter().map(|(r, p)| (r.name.as_str(), *p)).collect();

            let injection = injector.inject_batch(&phase, &batch);
            self.settle.after_injection(&phase, self.clock);
            self.verify(alloc, phase, Some(injection), result_log, summary)?;
        }

        if self.config.plan.verify_all_cycles && plan.cycle() > 1 {
            self.verify(alloc, Phase::AllCycles, None, result_log, summary)?;
        }

        if plan.second_phase_count() == 0 {
            log::info!("No second-phase prefixes configured");
            return Ok(());
        }

        let designated = &plan.designated_router().name;
        if !self.network.has_host(designated) {
            log::warn!("Designated router {} is not a network host, skipping second phase", designated);
            return Ok(());
        }

        let phase = Phase::SecondPhase;
        let injection = injector.inject(&phase, designated, alloc.assign_second_phase());
        self.settle.after_injection(&phase, self.clock);
        self.verify(alloc, phase, Some(injection), result_log, summary)
    }

    /// Wait for `phase` to converge and record it.
    ///
    /// On timeout the names still missing per host go to the result log
    /// ahead of the advert logs.
    fn verify(
        &self,
        alloc: &PrefixAllocator,
        phase: Phase,
        injection: Option<InjectionSummary>,
        result_log: &ResultLog,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let monitor = ConvergenceMonitor::new(
            self.network,
            self.clock,
            self.config.monitor.match_mode,
            self.config.timing.poll_interval,
            self.config.timing.parallel,
        );

        let fixed;
        let reloading;
        let source: &dyn TargetSource = if self.config.monitor.reload_source {
            reloading = ReloadingTarget::new(
                alloc.plan().clone(),
                self.config.plan.source.clone(),
                self.config.plan.format,
                phase,
            );
            &reloading
        } else {
            fixed = ConvergenceTarget::for_phase(alloc, phase)?;
            &fixed
        };

        let mut report = PhaseReport::new(phase);
        report.injection = injection;

        let result = monitor.await_convergence(source, self.config.timing.deadline);
        let label = match &result {
            Ok(convergence) => {
                report.convergence = Some(convergence.clone());
                format!("{} convergence", phase)
            }
            Err(_) => {
                if let Ok(target) = source.resolve() {
                    report.missing = monitor.missing_names(&target);
                }
                format!("{} timeout", phase)
            }
        };

        self.collect_logs(&label, &report.missing, result_log);
        summary.record(report);
        result?;
        Ok(())
    }

    fn collect_logs(&self, label: &str, misses: &[RouterMisses], result_log: &ResultLog) {
        let mut file = match result_log.open() {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Cannot open result log {:?}: {}", result_log.path(), e);
                return;
            }
        };

        if !misses.is_empty() {
            if let Err(e) = write_missing_report(label, misses, &mut file) {
                log::warn!("[{}] Failed to write missing routes: {}", label, e);
            }
        }

        AdvertLogCollector::new(self.network).collect(self.network.hosts(), label, &mut file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CommandError;
    use crate::settle::testing::ManualClock;
    use crate::settle::FixedDelays;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Every published name shows up in every host's table right away
    struct InstantNetwork {
        hosts: Vec<String>,
        published: Mutex<Vec<String>>,
        blocked: HashSet<String>,
        torn_down: Mutex<bool>,
    }

    impl InstantNetwork {
        fn new(hosts: &[&str]) -> Self {
            Self {
                hosts: hosts.iter().map(|h| h.to_string()).collect(),
                published: Mutex::new(Vec::new()),
                blocked: HashSet::new(),
                torn_down: Mutex::new(false),
            }
        }
    }

    impl RouterControl for InstantNetwork {
        fn hosts(&self) -> &[String] {
            &self.hosts
        }

        fn publish(&self, _router: &str, name: &str) -> Result<(), CommandError> {
            if !self.blocked.contains(name) {
                self.published.lock().unwrap().push(name.to_string());
            }
            Ok(())
        }

        fn route_table(&self, _router: &str) -> Result<String, CommandError> {
            Ok(self.published.lock().unwrap().join("\n"))
        }

        fn advert_log(&self, router: &str) -> Result<String, CommandError> {
            Ok(format!("log of {}\n", router))
        }

        fn teardown(&self) {
            *self.torn_down.lock().unwrap() = true;
        }
    }

    fn config(dir: &Path, routers: &[&str]) -> Config {
        let pool = dir.join("pool.txt");
        let lines: Vec<String> = (0..11).map(|i| format!("/p{}", i)).collect();
        fs::write(&pool, lines.join("\n")).unwrap();

        let mut config = Config::default();
        config.plan.routers = routers.iter().map(|r| r.to_string()).collect();
        config.plan.per_node = 2;
        config.plan.cycle = 2;
        config.plan.second_phase_count = 3;
        config.plan.source = pool;
        config.general.result_log = dir.join("result.txt");
        config.general.summary_json = Some(dir.join("summary.json"));
        config.general.clear_dirs = vec![dir.join("minindn")];
        config.network.payload.path = dir.join("test.bin");
        config.network.payload.size_bytes = 16;
        config.timing.deadline = Duration::from_secs(3);
        config
    }

    #[test]
    fn test_full_run_converges() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["a", "b"]);
        fs::create_dir_all(dir.path().join("minindn").join("a")).unwrap();

        let net = InstantNetwork::new(&["a", "b"]);
        let clock = ManualClock::new();
        let settle = FixedDelays::from_timing(&config.timing);
        let summary = Experiment::new(&config, &net, &clock, &settle).run().unwrap();

        assert!(summary.converged());
        let labels: Vec<&str> = summary.phases.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Cycle 1", "Cycle 2", "All cycles", "Second phase"]);
        assert!(summary.phases.iter().all(|p| p.convergence.as_ref().map(|c| c.ticks) == Some(1)));
        assert_eq!(net.published.lock().unwrap().len(), 11);
        assert!(*net.torn_down.lock().unwrap());
        assert!(!dir.path().join("minindn").exists());
        assert_eq!(fs::metadata(dir.path().join("test.bin")).unwrap().len(), 16);

        let log = fs::read_to_string(dir.path().join("result.txt")).unwrap();
        assert!(log.starts_with("\n===== Cycle 1 convergence =====\n\n--- Node a ---\nlog of a\n"));
        assert!(log.contains("\n===== Second phase convergence =====\n"));
        assert!(dir.path().join("summary.json").exists());
    }

    #[test]
    fn test_timeout_aborts_and_reports_missing() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["a", "b"]);

        let mut net = InstantNetwork::new(&["a", "b"]);
        net.blocked.insert("/minindn/b/p5".to_string());
        let clock = ManualClock::new();
        let settle = FixedDelays::none();
        let err = Experiment::new(&config, &net, &clock, &settle).run().unwrap_err();

        match err.downcast_ref::<MonitorError>() {
            Some(MonitorError::ConvergenceTimeout { phase, ticks, .. }) => {
                assert_eq!(*phase, Phase::Cycle(0));
                assert_eq!(*ticks, 3);
            }
            None => panic!("unexpected error: {:?}", err),
        }
        assert!(*net.torn_down.lock().unwrap());
        // Nothing from cycle 2 was published
        assert_eq!(net.published.lock().unwrap().len(), 3);

        let log = fs::read_to_string(dir.path().join("result.txt")).unwrap();
        assert!(log.contains("\n===== Cycle 1 timeout (missing routes) =====\n"));
        assert!(log.contains("/minindn/b/p5\n"));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["outcome"]["status"], "timed_out");
    }

    #[test]
    fn test_second_phase_skipped_without_designated_host() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), &["a", "b"]);
        config.network.hosts = Some(vec!["b".to_string()]);

        let net = InstantNetwork::new(&["b"]);
        // Router a's cycle names are already routed but it cannot publish
        net.published
            .lock()
            .unwrap()
            .extend((0..4).map(|i| format!("/minindn/a/p{}", i)));
        let clock = ManualClock::new();
        let settle = FixedDelays::none();
        let summary = Experiment::new(&config, &net, &clock, &settle).run().unwrap();

        assert!(summary.converged());
        assert!(summary.phases.iter().all(|p| p.phase != Phase::SecondPhase));
        assert_eq!(summary.phases[0].injection.as_ref().unwrap().skipped_routers, vec!["a".to_string()]);
    }

    #[test]
    fn test_insufficient_pool_tears_down_without_publishing() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), &["a", "b"]);
        config.plan.second_phase_count = 4;

        let net = InstantNetwork::new(&["a", "b"]);
        let clock = ManualClock::new();
        let settle = FixedDelays::none();
        let err = Experiment::new(&config, &net, &clock, &settle).run().unwrap_err();

        assert!(err.to_string().contains("needs at least 12"));
        assert!(net.published.lock().unwrap().is_empty());
        assert!(*net.torn_down.lock().unwrap());
        assert!(!dir.path().join("result.txt").exists());
    }

    #[test]
    fn test_missing_source_tears_down() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), &["a", "b"]);
        config.plan.source = dir.path().join("absent.txt");

        let net = InstantNetwork::new(&["a", "b"]);
        let clock = ManualClock::new();
        let settle = FixedDelays::none();
        let err = Experiment::new(&config, &net, &clock, &settle).run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::pool::PoolError>(),
            Some(crate::pool::PoolError::SourceNotFound { .. })
        ));
        assert!(*net.torn_down.lock().unwrap());
        assert!(net.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_check_phase_reports_missing_per_host() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["a", "b"]);
        let net = InstantNetwork::new(&["a", "b"]);
        net.published.lock().unwrap().push("/minindn/a/p0".to_string());

        let misses = check_phase(&config, &net, &ManualClock::new(), Phase::Cycle(0)).unwrap();
        assert_eq!(misses.len(), 2);
        assert_eq!(misses[0].missing, vec!["/minindn/a/p1", "/minindn/b/p4", "/minindn/b/p5"]);
    }
}
