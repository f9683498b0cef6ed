//! TOML configuration for the efficiency harness.
//!
//! Every section is optional; omitted sections and keys fall back to the
//! built-in defaults.
//!
//! ```toml
//! [kinematics]
//! drag_scale = 1.2e-5
//!
//! [terrain.t_dirt]
//! drag_coefficient = 5.0
//! safe_speed_modifier = 0.4
//!
//! [harness]
//! turn_limit = 500000
//! seed = 11
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use vehicle_efficiency_core::{ConfigurationError, GridPosition, Heading};
use vehicle_efficiency_system_kinematics::{KinematicsTuning, VehicleKinematics};
use vehicle_efficiency_system_terrain::{TerrainResistance, TerrainResistanceModel};

const CONFIG_DOCUMENT: &str = "simulation config";

/// Largest arena, in tiles, the harness will allocate.
pub const MAX_ARENA_TILES: u32 = 1 << 24;

/// Arena layout and trial limits used by the harness.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessSettings {
    /// Arena width in tiles.
    pub arena_columns: u32,
    /// Arena height in tiles.
    pub arena_rows: u32,
    /// Tile the vehicle starts on and is recentered to after every turn.
    pub start: GridPosition,
    /// Direction the vehicle travels.
    pub heading: Heading,
    /// Largest fraction of fuel randomly withheld at spawn.
    pub fuel_jitter: f64,
    /// Turns after which a still-running trial is abandoned.
    pub turn_limit: u64,
    /// Seed of the fuel jitter generator.
    pub seed: u64,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            arena_columns: 132,
            arena_rows: 132,
            start: GridPosition::new(60, 60),
            heading: Heading::North,
            fuel_jitter: 0.05,
            turn_limit: 1_000_000,
            seed: 7,
        }
    }
}

impl HarnessSettings {
    /// Rejects arenas that do not contain the start tile and out-of-range limits.
    pub fn validate(self) -> Result<Self, ConfigurationError> {
        if self.arena_columns == 0 || self.arena_rows == 0 {
            return Err(invalid("harness.arena", "arena must have at least one tile"));
        }
        let tiles = self.arena_columns.checked_mul(self.arena_rows);
        if !tiles.is_some_and(|tiles| tiles <= MAX_ARENA_TILES) {
            return Err(invalid(
                "harness.arena",
                &format!("arena must not exceed {MAX_ARENA_TILES} tiles"),
            ));
        }

        let inside = u32::try_from(self.start.x()).is_ok_and(|x| x < self.arena_columns)
            && u32::try_from(self.start.y()).is_ok_and(|y| y < self.arena_rows);
        if !inside {
            return Err(invalid("harness.start", "start tile lies outside the arena"));
        }

        if !(0.0..=1.0).contains(&self.fuel_jitter) {
            return Err(invalid("harness.fuel_jitter", "must lie within [0, 1]"));
        }
        if self.turn_limit == 0 {
            return Err(invalid("harness.turn_limit", "must be positive"));
        }

        Ok(self)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidTuning {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Complete configuration document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Kinematics coefficients.
    pub kinematics: KinematicsTuning,
    /// Terrain resistance overrides keyed by terrain tag.
    pub terrain: BTreeMap<String, TerrainResistance>,
    /// Arena layout and trial limits.
    pub harness: HarnessSettings,
}

impl SimulationConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(contents).map_err(|error| ConfigurationError::Parse {
            document: CONFIG_DOCUMENT.to_owned(),
            message: error.to_string(),
        })
    }

    /// Builds the kinematics model after validating its tuning.
    pub fn kinematics_model(&self) -> Result<VehicleKinematics, ConfigurationError> {
        Ok(VehicleKinematics::new(self.kinematics.validate()?))
    }

    /// Builds the terrain table with the configured overrides applied.
    pub fn terrain_model(&self) -> Result<TerrainResistanceModel, ConfigurationError> {
        TerrainResistanceModel::from_overrides(&self.terrain)
    }
}

#[cfg(test)]
mod tests {
    use super::{HarnessSettings, SimulationConfig};
    use approx::assert_relative_eq;
    use vehicle_efficiency_core::{ConfigurationError, GridPosition, Heading, TerrainKind};

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.harness.start, GridPosition::new(60, 60));
        assert_eq!(config.harness.heading, Heading::North);
        assert!(config.harness.clone().validate().is_ok());
    }

    #[test]
    fn sections_override_individual_keys() {
        let config = SimulationConfig::from_toml_str(
            r#"
                [kinematics]
                brake_decel = 600.0

                [terrain.unpaved]
                drag_coefficient = 5.0
                safe_speed_modifier = 0.4

                [harness]
                turn_limit = 5000
                heading = "East"
                start = { x = 10, y = 20 }
            "#,
        )
        .expect("config parses");

        assert_relative_eq!(config.kinematics.brake_decel, 600.0);
        assert_relative_eq!(config.kinematics.accel_scale, 20.0);
        assert_eq!(config.harness.turn_limit, 5_000);
        assert_eq!(config.harness.heading, Heading::East);
        assert_eq!(config.harness.start, GridPosition::new(10, 20));

        let terrain = config.terrain_model().expect("valid overrides");
        assert_relative_eq!(
            terrain.resistance(TerrainKind::Dirt).drag_coefficient,
            5.0
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = SimulationConfig::from_toml_str("[harness]\nlaps = 3");
        assert!(matches!(result, Err(ConfigurationError::Parse { .. })));
    }

    #[test]
    fn invalid_tuning_surfaces_when_building_models() {
        let config = SimulationConfig::from_toml_str("[kinematics]\naccel_scale = -1.0")
            .expect("syntactically valid");
        assert!(matches!(
            config.kinematics_model(),
            Err(ConfigurationError::InvalidTuning { field, .. }) if field == "accel_scale"
        ));
    }

    #[test]
    fn oversized_arenas_are_rejected() {
        let config = SimulationConfig::from_toml_str(
            "[harness]\narena_columns = 4000000000\narena_rows = 4000000000",
        )
        .expect("syntactically valid");
        assert!(matches!(
            config.harness.validate(),
            Err(ConfigurationError::InvalidTuning { field, .. }) if field == "harness.arena"
        ));

        let largest = HarnessSettings {
            arena_columns: 4_096,
            arena_rows: 4_096,
            ..HarnessSettings::default()
        };
        assert!(largest.validate().is_ok());

        let one_row_too_many = HarnessSettings {
            arena_columns: 4_096,
            arena_rows: 4_097,
            ..HarnessSettings::default()
        };
        assert!(one_row_too_many.validate().is_err());
    }

    #[test]
    fn start_must_lie_inside_the_arena() {
        let settings = HarnessSettings {
            arena_columns: 50,
            ..HarnessSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::InvalidTuning { field, .. }) if field == "harness.start"
        ));
    }
}
