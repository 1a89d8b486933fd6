use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let mut config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    // Pool sources live next to the experiment file unless given absolutely
    if config.plan.source.is_relative() {
        if let Some(dir) = config_path.parent() {
            config.plan.source = dir.join(&config.plan.source);
        }
    }

    config.validate()?;

    info!(
        "Plan: {} routers, {} prefixes x {} cycles per router, {} second-phase prefixes",
        config.plan.routers.len(),
        config.plan.per_node,
        config.plan.cycle,
        config.plan.second_phase_count
    );

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub deadline: Option<Duration>,
    pub parallel: bool,
    pub log_level: Option<String>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(deadline) = overrides.deadline {
        info!("Overriding convergence deadline: {:?}", deadline);
        config.timing.deadline = deadline;
    }

    if overrides.parallel {
        info!("Enabling parallel per-router dispatch");
        config.timing.parallel = true;
    }

    if let Some(level) = &overrides.log_level {
        config.general.log_level = Some(level.clone());
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
