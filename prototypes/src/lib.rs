#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Catalog of vehicle prototypes loaded from TOML.
//!
//! The built-in catalog ships with the crate. Alternative catalogs use the
//! same document layout:
//!
//! ```toml
//! version = 1
//!
//! [[vehicle]]
//! id = "car"
//! name = "Car"
//! mass_kg = 1500.0
//! max_velocity = 8000.0
//! drag_area = 1.0
//!
//! [vehicle.engine]
//! power_w = 100000.0
//! sources = ["gasoline"]
//! idle_burn = 1.0
//! load_burn = 20.0
//! distance_burn = 0.5
//!
//! [[vehicle.tank]]
//! source = "gasoline"
//! capacity = 50000.0
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use vehicle_efficiency_core::{ConfigurationError, EnergySource, PrototypeId};

const CATALOG_DOCUMENT: &str = "vehicle catalog";
const SUPPORTED_CATALOG_VERSION: u32 = 1;
const BUILTIN_CATALOG: &str = include_str!("../data/vehicles.toml");

/// Engine characteristics of a prototype.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSpec {
    /// Engine power in watts.
    pub power_w: f64,
    /// Energy sources the engine burns, highest priority first.
    pub sources: Vec<EnergySource>,
    /// Fuel drawn every running turn.
    pub idle_burn: f64,
    /// Additional fuel drawn per turn at full load.
    pub load_burn: f64,
    /// Additional fuel drawn per tile travelled.
    pub distance_burn: f64,
}

/// Tank fitted to a prototype.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TankSpec {
    /// Energy source stored in the tank.
    pub source: EnergySource,
    /// Maximum amount the tank can hold.
    pub capacity: f64,
    /// Fraction of the capacity filled when the vehicle spawns.
    #[serde(default = "full_tank")]
    pub fill: f64,
}

const fn full_tank() -> f64 {
    1.0
}

/// Static description of a vehicle type.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehiclePrototype {
    /// Catalog identifier.
    pub id: PrototypeId,
    /// Human-readable name.
    pub name: String,
    /// Total mass in kilograms.
    pub mass_kg: f64,
    /// Velocity the frame is rated for.
    pub max_velocity: f64,
    /// Relative frontal drag of the body.
    pub drag_area: f64,
    /// Engine fitted to the vehicle.
    pub engine: EngineSpec,
    /// Tanks fitted to the vehicle, in declaration order.
    #[serde(rename = "tank")]
    pub tanks: Vec<TankSpec>,
}

impl VehiclePrototype {
    fn validate(&self) -> Result<(), ConfigurationError> {
        let reject = |reason: String| ConfigurationError::MalformedPrototype {
            id: self.id.to_string(),
            reason,
        };

        if self.id.as_str().trim().is_empty() {
            return Err(reject("identifier must not be empty".to_owned()));
        }

        let positive = [
            ("mass_kg", self.mass_kg),
            ("max_velocity", self.max_velocity),
            ("engine.idle_burn", self.engine.idle_burn),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(reject(format!("{field} must be finite and positive")));
            }
        }

        let non_negative = [
            ("drag_area", self.drag_area),
            ("engine.power_w", self.engine.power_w),
            ("engine.load_burn", self.engine.load_burn),
            ("engine.distance_burn", self.engine.distance_burn),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(reject(format!("{field} must be finite and non-negative")));
            }
        }

        if self.engine.sources.is_empty() {
            return Err(reject("engine must burn at least one energy source".to_owned()));
        }
        if self.tanks.is_empty() {
            return Err(reject("at least one tank is required".to_owned()));
        }

        for (index, tank) in self.tanks.iter().enumerate() {
            if !tank.capacity.is_finite() || tank.capacity < 0.0 {
                return Err(reject(format!(
                    "tank {index} capacity must be finite and non-negative"
                )));
            }
            if !(0.0..=1.0).contains(&tank.fill) {
                return Err(reject(format!("tank {index} fill must lie within [0, 1]")));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    version: u32,
    #[serde(default, rename = "vehicle")]
    vehicles: Vec<VehiclePrototype>,
}

/// Validated set of prototypes keyed by identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct PrototypeCatalog {
    prototypes: BTreeMap<PrototypeId, VehiclePrototype>,
}

impl PrototypeCatalog {
    /// Catalog bundled with the crate.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parses and validates a catalog document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        let document: CatalogDocument =
            toml::from_str(contents).map_err(|error| ConfigurationError::Parse {
                document: CATALOG_DOCUMENT.to_owned(),
                message: error.to_string(),
            })?;

        if document.version != SUPPORTED_CATALOG_VERSION {
            return Err(ConfigurationError::UnsupportedVersion {
                document: CATALOG_DOCUMENT.to_owned(),
                found: document.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }

        let mut prototypes = BTreeMap::new();
        for prototype in document.vehicles {
            prototype.validate()?;
            let id = prototype.id.clone();
            if prototypes.insert(id.clone(), prototype).is_some() {
                return Err(ConfigurationError::DuplicatePrototype(id.to_string()));
            }
        }

        Ok(Self { prototypes })
    }

    /// Resolves a prototype by identifier.
    pub fn get(&self, id: &PrototypeId) -> Result<&VehiclePrototype, ConfigurationError> {
        self.prototypes
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownPrototype(id.clone()))
    }

    /// Iterates prototypes ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &VehiclePrototype> {
        self.prototypes.values()
    }

    /// Number of prototypes in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Reports whether the catalog holds no prototypes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::PrototypeCatalog;
    use vehicle_efficiency_core::{ConfigurationError, EnergySource, PrototypeId};

    const MINIMAL: &str = r#"
        version = 1

        [[vehicle]]
        id = "cart"
        name = "Cart"
        mass_kg = 300.0
        max_velocity = 2000.0
        drag_area = 0.8

        [vehicle.engine]
        power_w = 5000.0
        sources = ["diesel", "gasoline"]
        idle_burn = 0.1
        load_burn = 1.0
        distance_burn = 0.1

        [[vehicle.tank]]
        source = "gasoline"
        capacity = 100.0
        fill = 0.5
    "#;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = PrototypeCatalog::builtin().expect("builtin catalog parses");
        for id in ["car", "electric_car", "fire_truck", "tractor", "motorcycle", "apc"] {
            assert!(catalog.get(&PrototypeId::new(id)).is_ok(), "{id} missing");
        }

        let electric = catalog
            .get(&PrototypeId::new("electric_car"))
            .expect("electric car present");
        assert_eq!(electric.engine.sources, vec![EnergySource::Battery]);
        assert_eq!(electric.tanks[0].fill, 0.0);
    }

    #[test]
    fn iteration_is_ordered_by_identifier() {
        let catalog = PrototypeCatalog::builtin().expect("builtin catalog parses");
        let ids: Vec<&str> = catalog.iter().map(|prototype| prototype.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn tank_fill_defaults_to_full() {
        let contents = MINIMAL.replace("fill = 0.5", "");
        let catalog = PrototypeCatalog::from_toml_str(&contents).expect("catalog parses");
        let cart = catalog.get(&PrototypeId::new("cart")).expect("cart present");
        assert_eq!(cart.tanks[0].fill, 1.0);
        assert_eq!(
            cart.engine.sources,
            vec![EnergySource::Diesel, EnergySource::Gasoline]
        );
    }

    #[test]
    fn unknown_prototype_is_reported() {
        let catalog = PrototypeCatalog::from_toml_str(MINIMAL).expect("catalog parses");
        assert_eq!(
            catalog.get(&PrototypeId::new("hovercraft")),
            Err(ConfigurationError::UnknownPrototype(PrototypeId::new(
                "hovercraft"
            )))
        );
    }

    #[test]
    fn rejects_unsupported_version() {
        let contents = MINIMAL.replace("version = 1", "version = 2");
        assert_eq!(
            PrototypeCatalog::from_toml_str(&contents),
            Err(ConfigurationError::UnsupportedVersion {
                document: "vehicle catalog".to_owned(),
                found: 2,
                expected: 1,
            })
        );
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let vehicle = MINIMAL.replace("version = 1", "");
        let contents = format!("{MINIMAL}\n{vehicle}");
        assert_eq!(
            PrototypeCatalog::from_toml_str(&contents),
            Err(ConfigurationError::DuplicatePrototype("cart".to_owned()))
        );
    }

    #[test]
    fn rejects_engines_that_burn_nothing_while_idle() {
        let contents = MINIMAL.replace("idle_burn = 0.1", "idle_burn = 0.0");
        assert!(matches!(
            PrototypeCatalog::from_toml_str(&contents),
            Err(ConfigurationError::MalformedPrototype { id, .. }) if id == "cart"
        ));
    }

    #[test]
    fn rejects_overfilled_tanks() {
        let contents = MINIMAL.replace("fill = 0.5", "fill = 1.5");
        assert!(matches!(
            PrototypeCatalog::from_toml_str(&contents),
            Err(ConfigurationError::MalformedPrototype { .. })
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let contents = MINIMAL.replace("drag_area = 0.8", "drag_area = 0.8\nwings = 2");
        assert!(matches!(
            PrototypeCatalog::from_toml_str(&contents),
            Err(ConfigurationError::Parse { .. })
        ));
    }
}
