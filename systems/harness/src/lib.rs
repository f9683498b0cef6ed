#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Efficiency harness measuring how far a vehicle travels on one fill of fuel.
//!
//! A trial spawns the vehicle on a uniform arena with a slightly randomised
//! fuel level, cruises at the safe velocity until the engine stalls, and sums
//! the tiles covered each turn. The vehicle is moved back to its start tile
//! after every turn so that the arena never runs out.

mod config;
mod stats;

use std::fmt;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use vehicle_efficiency_core::{Command, ConfigurationError, PrototypeId, StallReason, TerrainKind};
use vehicle_efficiency_prototypes::PrototypeCatalog;
use vehicle_efficiency_system_integrator::{
    create_vehicle_with_fuel, force_reset_motion, is_running, safe_velocity, set_cruise,
    start_engine, step_turn, Simulation,
};
use vehicle_efficiency_system_kinematics::VehicleKinematics;
use vehicle_efficiency_system_terrain::TerrainResistanceModel;
use vehicle_efficiency_world::query;

pub use config::{HarnessSettings, SimulationConfig, MAX_ARENA_TILES};
pub use stats::{EfficiencyBand, Statistics};

/// Turns between forced stops in the stop-and-go survey scenarios.
pub const SURVEY_RESET_INTERVAL: u32 = 5;

/// Failures that prevent a trial from producing a distance.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The configuration or catalog is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The vehicle cannot move at all on the trial terrain.
    #[error("{prototype} has no safe velocity on {terrain}")]
    Immobile {
        /// Prototype under test.
        prototype: PrototypeId,
        /// Terrain of the arena.
        terrain: TerrainKind,
    },
    /// The vehicle was still running when the turn limit was reached.
    #[error("{prototype} still running after {turns} turns")]
    TurnLimitExceeded {
        /// Prototype under test.
        prototype: PrototypeId,
        /// Turns simulated before giving up.
        turns: u64,
    },
    /// The vehicle drove off the arena, so its distance is not a full tank's worth.
    #[error("{prototype} left the arena after {turns} turns and {tiles} tiles")]
    LeftArena {
        /// Prototype under test.
        prototype: PrototypeId,
        /// Turns simulated before the vehicle left.
        turns: u64,
        /// Tiles covered up to that point.
        tiles: u64,
    },
}

/// Scenario of a single efficiency trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrialConfig {
    /// Prototype under test.
    pub prototype: PrototypeId,
    /// Terrain covering the whole arena.
    pub terrain: TerrainKind,
    /// Turns between forced stops, if any.
    pub reset_every: Option<u32>,
}

impl TrialConfig {
    /// Creates a scenario without forced stops.
    #[must_use]
    pub fn new(prototype: PrototypeId, terrain: TerrainKind) -> Self {
        Self {
            prototype,
            terrain,
            reset_every: None,
        }
    }

    /// Brings the vehicle to a full stop every `turns` turns.
    #[must_use]
    pub fn with_resets(mut self, turns: u32) -> Self {
        self.reset_every = Some(turns);
        self
    }
}

impl fmt::Display for TrialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} with ", self.prototype, self.terrain)?;
        match self.reset_every {
            Some(turns) => write!(f, "resets every {turns} turns"),
            None => f.write_str("no resets"),
        }
    }
}

/// Result of a single trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialOutcome {
    /// Tiles covered before the engine stalled.
    pub tiles: u64,
    /// Turns simulated.
    pub turns: u64,
    /// Fraction of the prototype's fuel the vehicle spawned with.
    pub fuel_fraction: f64,
    /// Reason the engine stopped.
    pub stall: Option<StallReason>,
}

/// Outcomes of a batch of identical trials.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialSummary {
    /// Scenario every trial ran.
    pub trial: TrialConfig,
    /// Individual outcomes in execution order.
    pub outcomes: Vec<TrialOutcome>,
    /// Statistics over the distances travelled.
    pub statistics: Statistics,
}

impl fmt::Display for TrialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Testing {}: Min {}, Max {}, Midpoint {}.",
            self.trial,
            self.statistics.min,
            self.statistics.max,
            self.statistics.midpoint()
        )
    }
}

/// Runs efficiency trials against a validated configuration.
#[derive(Clone, Debug)]
pub struct EfficiencyHarness {
    catalog: PrototypeCatalog,
    terrain: TerrainResistanceModel,
    kinematics: VehicleKinematics,
    settings: HarnessSettings,
}

impl EfficiencyHarness {
    /// Validates the configuration and builds the models it describes.
    pub fn new(
        catalog: PrototypeCatalog,
        config: &SimulationConfig,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            catalog,
            terrain: config.terrain_model()?,
            kinematics: config.kinematics_model()?,
            settings: config.harness.clone().validate()?,
        })
    }

    /// Harness over the built-in catalog with default tuning.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::new(PrototypeCatalog::builtin()?, &SimulationConfig::default())
    }

    /// Prototypes available to trials.
    #[must_use]
    pub const fn catalog(&self) -> &PrototypeCatalog {
        &self.catalog
    }

    /// Arena layout and limits in use.
    #[must_use]
    pub const fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Runs one trial, drawing the fuel jitter from `rng`.
    pub fn run_trial<R: Rng>(
        &self,
        trial: &TrialConfig,
        rng: &mut R,
    ) -> Result<TrialOutcome, HarnessError> {
        if trial.reset_every == Some(0) {
            return Err(ConfigurationError::InvalidTuning {
                field: "reset_every".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }

        let settings = &self.settings;
        let mut sim = Simulation::new(
            self.catalog.clone(),
            self.terrain.clone(),
            self.kinematics.clone(),
        );
        sim.apply(Command::ConfigureArena {
            columns: settings.arena_columns,
            rows: settings.arena_rows,
            terrain: trial.terrain,
        });

        let jitter: f64 = rng.gen();
        let fuel_fraction = 1.0 - settings.fuel_jitter * jitter;
        let mut vehicle = create_vehicle_with_fuel(
            &mut sim,
            &trial.prototype,
            settings.start,
            settings.heading,
            fuel_fraction,
        )?;
        let _ = start_engine(&mut vehicle);

        let mut safe = safe_velocity(&sim, &vehicle);
        if safe <= 0.0 {
            return Err(HarnessError::Immobile {
                prototype: trial.prototype.clone(),
                terrain: trial.terrain,
            });
        }
        set_cruise(&mut vehicle, safe);

        let mut tiles = 0_u64;
        let mut turns = 0_u64;
        let mut since_reset = 0_u32;
        while is_running(&vehicle) && safe > 0.0 {
            if turns >= settings.turn_limit {
                return Err(HarnessError::TurnLimitExceeded {
                    prototype: trial.prototype.clone(),
                    turns,
                });
            }

            let _ = step_turn(&mut sim, &mut vehicle);
            turns += 1;
            if let Some(placement) = query::placement(sim.world()) {
                tiles += u64::from(settings.start.chebyshev_distance(placement.position()));
            }
            sim.recenter(settings.start);
            let _ = sim.drain_events();

            if let Some(every) = trial.reset_every {
                since_reset += 1;
                if since_reset >= every {
                    force_reset_motion(&mut vehicle);
                    since_reset = 0;
                }
            }
            safe = safe_velocity(&sim, &vehicle);
        }

        if vehicle.stall_reason() == Some(StallReason::OffGrid) {
            return Err(HarnessError::LeftArena {
                prototype: trial.prototype.clone(),
                turns,
                tiles,
            });
        }

        debug!(
            "{trial}: {tiles} tiles in {turns} turns on {:.4} of a tank ({:?})",
            fuel_fraction,
            vehicle.stall_reason()
        );
        Ok(TrialOutcome {
            tiles,
            turns,
            fuel_fraction,
            stall: vehicle.stall_reason(),
        })
    }

    /// Runs `count` trials seeded from the configured seed.
    pub fn run_trials(
        &self,
        trial: &TrialConfig,
        count: usize,
    ) -> Result<TrialSummary, HarnessError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed);
        let outcomes = (0..count)
            .map(|_| self.run_trial(trial, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        let distances: Vec<u64> = outcomes.iter().map(|outcome| outcome.tiles).collect();
        let statistics = Statistics::from_samples(&distances).ok_or_else(|| {
            ConfigurationError::InvalidTuning {
                field: "trials".to_owned(),
                reason: "at least one trial is required".to_owned(),
            }
        })?;

        let summary = TrialSummary {
            trial: trial.clone(),
            outcomes,
            statistics,
        };
        info!("{summary}");
        Ok(summary)
    }

    /// Runs the four standard scenarios for a prototype: pavement and dirt,
    /// each without and with a stop every [`SURVEY_RESET_INTERVAL`] turns.
    pub fn survey(
        &self,
        prototype: &PrototypeId,
        count: usize,
    ) -> Result<Vec<TrialSummary>, HarnessError> {
        let _ = self.catalog.get(prototype)?;
        let scenarios = [
            TrialConfig::new(prototype.clone(), TerrainKind::Pavement),
            TrialConfig::new(prototype.clone(), TerrainKind::Dirt),
            TrialConfig::new(prototype.clone(), TerrainKind::Pavement)
                .with_resets(SURVEY_RESET_INTERVAL),
            TrialConfig::new(prototype.clone(), TerrainKind::Dirt)
                .with_resets(SURVEY_RESET_INTERVAL),
        ];

        scenarios
            .iter()
            .map(|trial| self.run_trials(trial, count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EfficiencyHarness, HarnessError, Statistics, TrialConfig, TrialOutcome, TrialSummary,
    };
    use vehicle_efficiency_core::{ConfigurationError, PrototypeId, TerrainKind};

    #[test]
    fn trial_config_describes_itself_like_the_report() {
        let plain = TrialConfig::new(PrototypeId::new("car"), TerrainKind::Pavement);
        assert_eq!(plain.to_string(), "car on t_pavement with no resets");
        let stops = plain.with_resets(5);
        assert_eq!(stops.to_string(), "car on t_pavement with resets every 5 turns");
    }

    #[test]
    fn summary_line_reports_extremes_and_midpoint() {
        let summary = TrialSummary {
            trial: TrialConfig::new(PrototypeId::new("tractor"), TerrainKind::Dirt),
            outcomes: vec![TrialOutcome {
                tiles: 100,
                turns: 10,
                fuel_fraction: 1.0,
                stall: None,
            }],
            statistics: Statistics {
                min: 100,
                max: 103,
                mean: 101.5,
                count: 2,
            },
        };
        assert_eq!(
            summary.to_string(),
            "Testing tractor on t_dirt with no resets: Min 100, Max 103, Midpoint 101.5."
        );
    }

    #[test]
    fn zero_reset_interval_is_rejected() {
        let harness = EfficiencyHarness::builtin().expect("builtin harness");
        let trial = TrialConfig::new(PrototypeId::new("car"), TerrainKind::Pavement).with_resets(0);
        let result = harness.run_trials(&trial, 1);
        assert!(matches!(
            result,
            Err(HarnessError::Configuration(ConfigurationError::InvalidTuning { .. }))
        ));
    }
}
