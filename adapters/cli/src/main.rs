#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs vehicle efficiency trials.

mod logging;

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vehicle_efficiency_core::{PrototypeId, TerrainKind};
use vehicle_efficiency_prototypes::PrototypeCatalog;
use vehicle_efficiency_system_harness::{EfficiencyHarness, SimulationConfig, TrialConfig};

/// Measures how far vehicles travel on a tank of fuel.
#[derive(Debug, Parser)]
#[command(name = "vehicle-efficiency", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Vehicle catalog to load instead of the built-in one
    #[arg(long, global = true, value_name = "TOML")]
    catalog: Option<PathBuf>,

    /// Simulation configuration overriding tuning, terrain and harness defaults
    #[arg(long, global = true, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Print debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the vehicle prototypes in the catalog
    List,
    /// Run repeated trials of a single scenario
    Trial {
        /// Prototype identifier
        #[arg(long)]
        vehicle: String,
        /// Terrain covering the arena (e.g. t_pavement, dirt)
        #[arg(long, default_value = "t_pavement")]
        terrain: TerrainKind,
        /// Bring the vehicle to a full stop every N turns
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        reset_every: Option<u32>,
        /// Number of trials to run
        #[arg(long, default_value_t = 10)]
        trials: usize,
        /// Seed of the fuel jitter generator
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the pavement and dirt scenarios with and without stops
    Survey {
        /// Prototype identifier
        #[arg(long)]
        vehicle: String,
        /// Number of trials per scenario
        #[arg(long, default_value_t = 10)]
        trials: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let catalog = load_catalog(cli.catalog.as_deref())?;
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => {
            for prototype in catalog.iter() {
                let sources: Vec<String> = prototype
                    .engine
                    .sources
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!(
                    "{:<14} {} ({} kg, {} kW, {})",
                    prototype.id,
                    prototype.name,
                    prototype.mass_kg,
                    prototype.engine.power_w / 1_000.0,
                    sources.join(", ")
                );
            }
        }
        Commands::Trial {
            vehicle,
            terrain,
            reset_every,
            trials,
            seed,
        } => {
            if let Some(seed) = seed {
                config.harness.seed = seed;
            }
            let harness = EfficiencyHarness::new(catalog, &config)
                .context("invalid simulation configuration")?;
            let trial = TrialConfig {
                prototype: PrototypeId::new(vehicle),
                terrain,
                reset_every,
            };
            let summary = harness
                .run_trials(&trial, trials)
                .with_context(|| format!("trial of {trial} failed"))?;
            println!("{summary}");
        }
        Commands::Survey { vehicle, trials } => {
            let harness = EfficiencyHarness::new(catalog, &config)
                .context("invalid simulation configuration")?;
            let prototype = PrototypeId::new(vehicle);
            let summaries = harness
                .survey(&prototype, trials)
                .with_context(|| format!("survey of {prototype} failed"))?;
            for summary in summaries {
                println!("{summary}");
            }
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<PrototypeCatalog> {
    let Some(path) = path else {
        return PrototypeCatalog::builtin().context("built-in vehicle catalog is invalid");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read vehicle catalog at {}", path.display()))?;
    PrototypeCatalog::from_toml_str(&contents)
        .with_context(|| format!("invalid vehicle catalog at {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
    SimulationConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid simulation config at {}", path.display()))
}
