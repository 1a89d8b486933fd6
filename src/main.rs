use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use dvconverge::config::Config;
use dvconverge::config_loader::{self, CliOverrides};
use dvconverge::experiment::{self, Experiment, ExperimentContext};
use dvconverge::monitor::{ConvergenceTarget, Phase};
use dvconverge::network::ShellNetwork;
use dvconverge::settle::{FixedDelays, SystemClock};

/// Prefix injection and convergence checks for distance-vector routing experiments
#[derive(Parser, Debug)]
#[command(name = "dvconverge", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the experiment configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inject every phase and wait for convergence after each
    Run {
        /// Per-phase convergence deadline, e.g. "45s"
        #[arg(long)]
        deadline: Option<humantime::Duration>,

        /// Dispatch per-router injection and route queries in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Print the prefix allocation without touching the network
    Plan,

    /// Query every host once and list the names it is still missing
    Check {
        /// Cycle number, starting at 1
        #[arg(long, conflicts_with = "second_phase")]
        cycle: Option<usize>,

        /// Check the second-phase names instead of a cycle
        #[arg(long)]
        second_phase: bool,
    },
}

impl Commands {
    fn overrides(&self, log_level: Option<String>) -> CliOverrides {
        match self {
            Commands::Run { deadline, parallel } => CliOverrides {
                deadline: deadline.as_ref().map(|d| **d),
                parallel: *parallel,
                log_level,
            },
            _ => CliOverrides {
                log_level,
                ..Default::default()
            },
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut config = config_loader::load_config(&cli.config)?;
    config_loader::apply_overrides(&mut config, &cli.command.overrides(cli.log_level.clone()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level())).init();
    info!("Configuration file: {:?}", cli.config);

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .wrap_err("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Run { .. } => run(&config),
        Commands::Plan => print_plan(&config),
        Commands::Check { cycle, second_phase } => check(&config, cycle, second_phase),
    }
}

fn shell_network(config: &Config) -> ShellNetwork {
    ShellNetwork::new(
        config.hosts(),
        config.network.clone(),
        ExperimentContext::from_config(config),
    )
}

fn run(config: &Config) -> Result<()> {
    let network = shell_network(config);
    let clock = SystemClock::new();
    let settle = FixedDelays::from_timing(&config.timing);

    let summary = Experiment::new(config, &network, &clock, &settle).run()?;

    for (label, secs) in summary.elapsed_by_phase() {
        println!("{}: converged in {} seconds", label, secs);
    }
    info!("Advert logs written to {:?}", config.general.result_log);
    Ok(())
}

fn print_plan(config: &Config) -> Result<()> {
    let alloc = experiment::build_allocator(config)?;
    let plan = alloc.plan();

    println!(
        "{} routers, {} prefixes per cycle, {} cycles, {} second-phase prefixes ({} of {} pool entries used)",
        plan.routers().len(),
        plan.per_node(),
        plan.cycle(),
        plan.second_phase_count(),
        plan.required_prefixes(),
        alloc.pool().len()
    );

    for c in 0..plan.cycle() {
        println!("\n[{}]", Phase::Cycle(c));
        for name in ConvergenceTarget::cycle(&alloc, c)?.names() {
            println!("  {}", name);
        }
    }

    println!("\n[{} via {}]", Phase::SecondPhase, plan.designated_router().name);
    for name in ConvergenceTarget::second_phase(&alloc).names() {
        println!("  {}", name);
    }
    Ok(())
}

fn check(config: &Config, cycle: Option<usize>, second_phase: bool) -> Result<()> {
    let phase = match (cycle, second_phase) {
        (_, true) => Phase::SecondPhase,
        (Some(0), false) => return Err(eyre!("Cycle numbers start at 1")),
        (Some(n), false) => Phase::Cycle(n - 1),
        (None, false) => Phase::AllCycles,
    };

    let network = shell_network(config);
    let misses = experiment::check_phase(config, &network, &SystemClock::new(), phase)?;

    let mut converged = true;
    for entry in &misses {
        if let Some(error) = &entry.error {
            println!("{}: route query failed: {}", entry.router, error);
        }
        if entry.missing.is_empty() {
            println!("{}: complete", entry.router);
            continue;
        }
        converged = false;
        println!("{}: missing {} names", entry.router, entry.missing.len());
        for name in &entry.missing {
            println!("  {}", name);
        }
    }

    if converged {
        println!("[{}] converged on all {} hosts", phase, misses.len());
        Ok(())
    } else {
        Err(eyre!("[{}] not converged", phase))
    }
}
