#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain resistance model mapping terrain classifications to drag and speed limits.

use std::collections::BTreeMap;

use serde::Deserialize;
use vehicle_efficiency_core::{ConfigurationError, TerrainKind};

const TERRAIN_DOCUMENT: &str = "terrain table";

/// Drag and safe-speed coefficients of a single terrain kind.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerrainResistance {
    /// Multiplier applied to the velocity-squared drag loss.
    pub drag_coefficient: f64,
    /// Fraction of the reference velocity a vehicle may safely reach.
    pub safe_speed_modifier: f64,
}

impl TerrainResistance {
    /// Creates a new resistance entry.
    #[must_use]
    pub const fn new(drag_coefficient: f64, safe_speed_modifier: f64) -> Self {
        Self {
            drag_coefficient,
            safe_speed_modifier,
        }
    }

    fn validate(self, terrain: TerrainKind) -> Result<Self, ConfigurationError> {
        let reject = |reason: &str| ConfigurationError::InvalidTerrainCoefficient {
            terrain,
            reason: reason.to_owned(),
        };

        if !self.drag_coefficient.is_finite() || self.drag_coefficient < 0.0 {
            return Err(reject("drag coefficient must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&self.safe_speed_modifier) {
            return Err(reject("safe speed modifier must lie within [0, 1]"));
        }
        Ok(self)
    }
}

/// Total lookup table from terrain kind to resistance.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainResistanceModel {
    table: [TerrainResistance; TerrainKind::COUNT],
}

impl TerrainResistanceModel {
    /// Resistance of the provided terrain kind.
    #[must_use]
    pub fn resistance(&self, terrain: TerrainKind) -> TerrainResistance {
        self.table[terrain.index()]
    }

    /// Resolves a terrain tag and returns its resistance.
    pub fn lookup(&self, tag: &str) -> Result<TerrainResistance, ConfigurationError> {
        let terrain: TerrainKind = tag.parse()?;
        Ok(self.resistance(terrain))
    }

    /// Replaces the entry of a single terrain kind after validating it.
    pub fn with_override(
        mut self,
        terrain: TerrainKind,
        resistance: TerrainResistance,
    ) -> Result<Self, ConfigurationError> {
        self.table[terrain.index()] = resistance.validate(terrain)?;
        Ok(self)
    }

    /// Builds a model from the defaults with tag-keyed overrides applied.
    pub fn from_overrides(
        overrides: &BTreeMap<String, TerrainResistance>,
    ) -> Result<Self, ConfigurationError> {
        overrides
            .iter()
            .try_fold(Self::default(), |model, (tag, resistance)| {
                let terrain: TerrainKind = tag.parse()?;
                model.with_override(terrain, *resistance)
            })
    }

    /// Parses a TOML document of `[<tag>]` tables overriding the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        let overrides: BTreeMap<String, TerrainResistance> =
            toml::from_str(contents).map_err(|error| ConfigurationError::Parse {
                document: TERRAIN_DOCUMENT.to_owned(),
                message: error.to_string(),
            })?;
        Self::from_overrides(&overrides)
    }
}

impl Default for TerrainResistanceModel {
    fn default() -> Self {
        Self {
            table: TerrainKind::ALL.map(default_resistance),
        }
    }
}

const fn default_resistance(terrain: TerrainKind) -> TerrainResistance {
    match terrain {
        TerrainKind::Pavement => TerrainResistance::new(1.0, 1.0),
        TerrainKind::Gravel => TerrainResistance::new(2.5, 0.7),
        TerrainKind::Grass => TerrainResistance::new(3.0, 0.55),
        TerrainKind::Dirt => TerrainResistance::new(4.0, 0.45),
        TerrainKind::Sand => TerrainResistance::new(8.0, 0.25),
        TerrainKind::Rock => TerrainResistance::new(10.0, 0.0),
    }
}
