//! JSON summary of a run.

use crate::inject::InjectionSummary;
use crate::monitor::{Convergence, Phase, RouterMisses};
use chrono::Utc;
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Running,
    Converged,
    TimedOut { phase: Phase },
    Aborted { error: String },
}

/// Record of one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<Convergence>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<RouterMisses>,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            label: phase.to_string(),
            injection: None,
            convergence: None,
            missing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    pub namespace: String,
    pub routers: Vec<String>,
    pub phases: Vec<PhaseReport>,
    pub outcome: Outcome,
}

impl RunSummary {
    pub fn new(namespace: &str, routers: Vec<String>) -> Self {
        Self {
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            namespace: namespace.to_string(),
            routers,
            phases: Vec::new(),
            outcome: Outcome::Running,
        }
    }

    pub fn record(&mut self, phase: PhaseReport) {
        self.phases.push(phase);
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.finished_at = Some(Utc::now().to_rfc3339());
        self.outcome = outcome;
    }

    pub fn converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }

    /// `(label, seconds)` for every phase that converged
    pub fn elapsed_by_phase(&self) -> impl Iterator<Item = (&str, u64)> {
        self.phases
            .iter()
            .filter_map(|p| p.convergence.as_ref().map(|c| (p.label.as_str(), c.elapsed_secs)))
    }

    pub fn write_json(&self, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary to JSON")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write run summary to {}", output_path.display()))?;

        log::info!("Run summary written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RunSummary {
        let mut summary = RunSummary::new("/minindn", vec!["a".to_string(), "b".to_string()]);
        let mut cycle = PhaseReport::new(Phase::Cycle(0));
        cycle.injection = Some(InjectionSummary {
            published: 4,
            failed: 0,
            skipped_routers: vec![],
        });
        cycle.convergence = Some(Convergence {
            phase: Phase::Cycle(0),
            elapsed_secs: 3,
            ticks: 3,
        });
        summary.record(cycle);

        let mut second = PhaseReport::new(Phase::SecondPhase);
        second.missing = vec![RouterMisses {
            router: "b".to_string(),
            missing: vec!["/minindn/a/p8".to_string()],
            error: None,
        }];
        summary.record(second);
        summary.finish(Outcome::TimedOut {
            phase: Phase::SecondPhase,
        });
        summary
    }

    #[test]
    fn test_elapsed_by_phase() {
        let summary = sample();
        assert!(!summary.converged());
        assert_eq!(summary.elapsed_by_phase().collect::<Vec<_>>(), vec![("Cycle 1", 3)]);
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        sample().write_json(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["namespace"], "/minindn");
        assert_eq!(value["outcome"]["status"], "timed_out");
        assert_eq!(value["outcome"]["phase"], "second_phase");
        assert_eq!(value["phases"][0]["label"], "Cycle 1");
        assert_eq!(value["phases"][0]["phase"]["cycle"], 0);
        assert_eq!(value["phases"][0]["convergence"]["elapsed_secs"], 3);
        assert_eq!(value["phases"][0]["injection"]["published"], 4);
        assert!(value["phases"][0].get("missing").is_none());
        assert_eq!(value["phases"][1]["missing"][0]["router"], "b");
        assert!(value["finished_at"].is_string());
    }
}
