use crate::network::MatchMode;
use crate::pool::SourceFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default namespace every published name is rooted under
pub const DEFAULT_NAMESPACE: &str = "/minindn";

/// Top-level experiment configuration that mirrors the YAML file
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub plan: PlanConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.namespace.trim().trim_end_matches('/').is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "namespace cannot be empty".to_string(),
            ));
        }

        self.validate_plan()?;

        if self.timing.poll_interval.is_zero() {
            return Err(ValidationError::InvalidTiming(
                "poll_interval must be greater than zero".to_string(),
            ));
        }

        if self.network.publish.trim().is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "publish command template cannot be empty".to_string(),
            ));
        }
        if self.network.route_list.trim().is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "route_list command template cannot be empty".to_string(),
            ));
        }
        if let Some(hosts) = &self.network.hosts {
            if hosts.is_empty() {
                return Err(ValidationError::InvalidNetwork(
                    "hosts cannot be an empty list".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_plan(&self) -> Result<(), ValidationError> {
        let plan = &self.plan;
        if plan.routers.is_empty() {
            return Err(ValidationError::InvalidPlan(
                "routers cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for router in &plan.routers {
            if router.trim().is_empty() || router.contains('/') {
                return Err(ValidationError::InvalidPlan(format!(
                    "router name '{}' must be non-empty and contain no '/'",
                    router
                )));
            }
            if !seen.insert(router.as_str()) {
                return Err(ValidationError::InvalidPlan(format!(
                    "router '{}' is listed more than once",
                    router
                )));
            }
        }

        if let Some(designated) = &plan.designated_router {
            if !plan.routers.contains(designated) {
                return Err(ValidationError::InvalidPlan(format!(
                    "designated_router '{}' is not one of the routers",
                    designated
                )));
            }
        }

        if plan.source.as_os_str().is_empty() {
            return Err(ValidationError::InvalidPlan(
                "source cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Nodes polled for convergence; falls back to the plan's routers
    pub fn hosts(&self) -> Vec<String> {
        self.network
            .hosts
            .clone()
            .unwrap_or_else(|| self.plan.routers.clone())
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.general.log_level.as_deref().unwrap_or("info")
    }
}

/// Run-wide settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Consolidated advertisement log, truncated at the start of each run
    #[serde(default = "default_result_log")]
    pub result_log: PathBuf,
    /// Optional machine-readable summary of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_json: Option<PathBuf>,
    /// Directories removed before the run (stale per-node logs)
    #[serde(default)]
    pub clear_dirs: Vec<PathBuf>,
    /// Trust anchor name handed to command templates as `{trust_anchor}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_anchor: Option<String>,
}

/// Prefix partitioning parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlanConfig {
    pub routers: Vec<String>,
    pub per_node: usize,
    pub cycle: usize,
    #[serde(default)]
    pub second_phase_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designated_router: Option<String>,
    /// Pool file; relative paths are resolved against the config file's directory
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
    /// Check the cumulative set of all cycles after the last cycle
    #[serde(default = "default_true")]
    pub verify_all_cycles: bool,
}

/// Delays and deadlines.
///
/// The delays stand in for an acknowledgment channel the routers do not have.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(with = "humantime_serde", default = "default_per_item_delay")]
    pub per_item_delay: Duration,
    #[serde(with = "humantime_serde", default = "default_second_phase_item_delay")]
    pub second_phase_item_delay: Duration,
    #[serde(with = "humantime_serde", default = "default_cycle_settle")]
    pub cycle_settle: Duration,
    #[serde(with = "humantime_serde", default = "default_second_phase_settle")]
    pub second_phase_settle: Duration,
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_deadline")]
    pub deadline: Duration,
    /// Dispatch per-router injection and route queries in parallel
    #[serde(default)]
    pub parallel: bool,
}

/// Convergence detection settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Re-read the pool source on every tick; a missing source then only
    /// fails the tick instead of the run
    #[serde(default)]
    pub reload_source: bool,
}

/// Shell command templates used to drive the emulated routers.
///
/// Templates may reference `{router}`, `{name}`, `{payload}`, `{namespace}`
/// and `{trust_anchor}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default = "default_publish")]
    pub publish: String,
    #[serde(default = "default_route_list")]
    pub route_list: String,
    #[serde(default = "default_advert_log")]
    pub advert_log: String,
    /// Wrapper placed in front of every per-router command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_prefix: Option<String>,
    #[serde(default)]
    pub teardown: Vec<String>,
    #[serde(default)]
    pub payload: PayloadConfig,
}

/// Content file fed to every publish command
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayloadConfig {
    #[serde(default = "default_payload_path")]
    pub path: PathBuf,
    #[serde(default = "default_payload_size")]
    pub size_bytes: u64,
    #[serde(default)]
    pub seed: u64,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid plan configuration: {0}")]
    InvalidPlan(String),
    #[error("Invalid timing configuration: {0}")]
    InvalidTiming(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_result_log() -> PathBuf {
    PathBuf::from("/tmp/final_advert_log.txt")
}

fn default_true() -> bool {
    true
}

fn default_per_item_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_second_phase_item_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_cycle_settle() -> Duration {
    Duration::from_secs(5)
}

fn default_second_phase_settle() -> Duration {
    Duration::from_secs(1)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_deadline() -> Duration {
    Duration::from_secs(30)
}

fn default_publish() -> String {
    "ndnd put --expose \"{name}\" < {payload} &".to_string()
}

fn default_route_list() -> String {
    "ndnd fw route-list".to_string()
}

fn default_advert_log() -> String {
    "/tmp/minindn/{router}/advert_log.txt".to_string()
}

fn default_payload_path() -> PathBuf {
    PathBuf::from("/tmp/test.bin")
}

fn default_payload_size() -> u64 {
    10 * 1024 * 1024
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            log_level: Some("info".to_string()),
            result_log: default_result_log(),
            summary_json: None,
            clear_dirs: Vec::new(),
            trust_anchor: None,
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            routers: Vec::new(),
            per_node: 0,
            cycle: 0,
            second_phase_count: 0,
            designated_router: None,
            source: PathBuf::new(),
            format: None,
            verify_all_cycles: true,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            per_item_delay: default_per_item_delay(),
            second_phase_item_delay: default_second_phase_item_delay(),
            cycle_settle: default_cycle_settle(),
            second_phase_settle: default_second_phase_settle(),
            poll_interval: default_poll_interval(),
            deadline: default_deadline(),
            parallel: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hosts: None,
            publish: default_publish(),
            route_list: default_route_list(),
            advert_log: default_advert_log(),
            exec_prefix: None,
            teardown: Vec::new(),
            payload: PayloadConfig::default(),
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            path: default_payload_path(),
            size_bytes: default_payload_size(),
            seed: 0,
        }
    }
}
