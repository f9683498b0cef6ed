#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the vehicle efficiency simulator.
//!
//! This crate defines the message surface that connects the authoritative
//! tile-grid world, the per-turn systems, and the efficiency harness. Callers
//! submit [`Command`] values describing desired world mutations, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values describing what changed. The turn integrator reports each
//! simulated turn through a [`TurnResult`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the arena with a uniform grid of the provided terrain.
    ConfigureArena {
        /// Number of tile columns laid out in the arena.
        columns: u32,
        /// Number of tile rows laid out in the arena.
        rows: u32,
        /// Terrain assigned to every tile of the new arena.
        terrain: TerrainKind,
    },
    /// Overwrites the terrain of a single tile.
    PaintTerrain {
        /// Tile whose terrain should change.
        position: GridPosition,
        /// Terrain assigned to the tile.
        terrain: TerrainKind,
    },
    /// Places the simulated vehicle, replacing any previous placement.
    PlaceVehicle {
        /// Tile occupied by the vehicle.
        position: GridPosition,
        /// Direction the vehicle faces.
        heading: Heading,
    },
    /// Moves the placed vehicle by the provided whole-tile offset.
    DisplaceVehicle {
        /// Offset applied to the vehicle position.
        delta: GridDelta,
    },
    /// Teleports the placed vehicle without touching any kinematic state.
    RecenterVehicle {
        /// Tile the vehicle should occupy afterwards.
        position: GridPosition,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new arena replaced the previous one.
    ArenaConfigured {
        /// Number of tile columns in the arena.
        columns: u32,
        /// Number of tile rows in the arena.
        rows: u32,
        /// Terrain that fills the arena.
        terrain: TerrainKind,
    },
    /// Confirms that a tile received new terrain.
    TerrainPainted {
        /// Tile that changed.
        position: GridPosition,
        /// Terrain now assigned to the tile.
        terrain: TerrainKind,
    },
    /// Reports that a paint request targeted a tile outside the arena.
    TerrainPaintRejected {
        /// Tile named in the rejected request.
        position: GridPosition,
    },
    /// Confirms that the vehicle was placed into the world.
    VehiclePlaced {
        /// Tile occupied by the vehicle.
        position: GridPosition,
        /// Direction the vehicle faces.
        heading: Heading,
    },
    /// Confirms that the vehicle moved between two tiles.
    VehicleDisplaced {
        /// Tile occupied before the move.
        from: GridPosition,
        /// Tile occupied after the move.
        to: GridPosition,
    },
    /// Confirms that the vehicle was teleported.
    VehicleRecentered {
        /// Tile occupied before the teleport.
        from: GridPosition,
        /// Tile occupied after the teleport.
        to: GridPosition,
    },
}

/// Location of a single tile expressed as signed grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    x: i32,
    y: i32,
}

impl GridPosition {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile; grows eastward.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile; grows southward.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Chebyshev ("square") distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Returns the position reached by applying the provided offset.
    #[must_use]
    pub const fn offset(self, delta: GridDelta) -> Self {
        Self {
            x: self.x.saturating_add(delta.dx),
            y: self.y.saturating_add(delta.dy),
        }
    }
}

/// Whole-tile offset between two grid positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDelta {
    dx: i32,
    dy: i32,
}

impl GridDelta {
    /// Offset that leaves a position unchanged.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Column offset.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Row offset.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether the offset moves nothing.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Compass directions a vehicle may face.
///
/// Rows grow southward, so `North` decreases `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Toward decreasing rows.
    North,
    /// Toward increasing columns and decreasing rows.
    NorthEast,
    /// Toward increasing columns.
    East,
    /// Toward increasing columns and rows.
    SouthEast,
    /// Toward increasing rows.
    South,
    /// Toward decreasing columns and increasing rows.
    SouthWest,
    /// Toward decreasing columns.
    West,
    /// Toward decreasing columns and rows.
    NorthWest,
}

impl Heading {
    /// Snaps an angle in degrees to the nearest compass heading.
    ///
    /// Zero degrees faces east and angles grow clockwise on screen, so
    /// `-90` faces north.
    #[must_use]
    pub const fn from_degrees(degrees: i32) -> Self {
        let normalized = degrees.rem_euclid(360);
        match ((normalized + 22) / 45) % 8 {
            0 => Self::East,
            1 => Self::SouthEast,
            2 => Self::South,
            3 => Self::SouthWest,
            4 => Self::West,
            5 => Self::NorthWest,
            6 => Self::North,
            _ => Self::NorthEast,
        }
    }

    /// Offset covered by a single tile of travel along the heading.
    #[must_use]
    pub const fn unit(self) -> GridDelta {
        match self {
            Self::North => GridDelta::new(0, -1),
            Self::NorthEast => GridDelta::new(1, -1),
            Self::East => GridDelta::new(1, 0),
            Self::SouthEast => GridDelta::new(1, 1),
            Self::South => GridDelta::new(0, 1),
            Self::SouthWest => GridDelta::new(-1, 1),
            Self::West => GridDelta::new(-1, 0),
            Self::NorthWest => GridDelta::new(-1, -1),
        }
    }

    /// Offset covered by `tiles` whole tiles of travel along the heading.
    ///
    /// Diagonal travel advances both axes, so the Chebyshev length of the
    /// result always equals `tiles`.
    #[must_use]
    pub const fn displacement(self, tiles: i32) -> GridDelta {
        let unit = self.unit();
        GridDelta::new(
            unit.dx.saturating_mul(tiles),
            unit.dy.saturating_mul(tiles),
        )
    }
}

/// Terrain classification resolved per grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Paved road surface.
    #[serde(rename = "t_pavement")]
    Pavement,
    /// Loose gravel.
    #[serde(rename = "t_gravel")]
    Gravel,
    /// Open grassland.
    #[serde(rename = "t_grass")]
    Grass,
    /// Unpaved dirt track.
    #[serde(rename = "t_dirt")]
    Dirt,
    /// Deep sand.
    #[serde(rename = "t_sand")]
    Sand,
    /// Bare rock that no wheel can cross.
    #[serde(rename = "t_rock")]
    Rock,
}

impl TerrainKind {
    /// Number of terrain kinds.
    pub const COUNT: usize = 6;

    /// Every terrain kind in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Pavement,
        Self::Gravel,
        Self::Grass,
        Self::Dirt,
        Self::Sand,
        Self::Rock,
    ];

    /// Canonical tag used in configuration files and reports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Pavement => "t_pavement",
            Self::Gravel => "t_gravel",
            Self::Grass => "t_grass",
            Self::Dirt => "t_dirt",
            Self::Sand => "t_sand",
            Self::Rock => "t_rock",
        }
    }

    /// Dense index of the kind within [`TerrainKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pavement => 0,
            Self::Gravel => 1,
            Self::Grass => 2,
            Self::Dirt => 3,
            Self::Sand => 4,
            Self::Rock => 5,
        }
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TerrainKind {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "t_pavement" | "pavement" | "paved" => Ok(Self::Pavement),
            "t_gravel" | "gravel" => Ok(Self::Gravel),
            "t_grass" | "grass" => Ok(Self::Grass),
            "t_dirt" | "dirt" | "unpaved" => Ok(Self::Dirt),
            "t_sand" | "sand" => Ok(Self::Sand),
            "t_rock" | "rock" => Ok(Self::Rock),
            other => Err(ConfigurationError::UnknownTerrain(other.to_owned())),
        }
    }
}

/// Kinds of stored energy an engine can burn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    /// Petrol for spark-ignition engines.
    Gasoline,
    /// Diesel for compression-ignition engines.
    Diesel,
    /// Electric charge held in batteries.
    Battery,
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gasoline => "gasoline",
            Self::Diesel => "diesel",
            Self::Battery => "battery",
        };
        f.write_str(name)
    }
}

/// Identifier of a vehicle prototype within the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrototypeId(String);

impl PrototypeId {
    /// Creates a prototype identifier from the provided name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a simulated engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Engine off; the vehicle rests.
    Idle,
    /// Engine on; the vehicle may be moving.
    Running,
    /// Engine forced off. Terminal for the trial.
    Stalled,
}

/// Reasons the integrator forces an engine off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StallReason {
    /// Every burnable tank ran dry.
    FuelExhausted,
    /// The vehicle cannot move on its current tile.
    NoSafeVelocity,
    /// The vehicle is not standing on a tile of the arena.
    OffGrid,
}

/// Outcome of a single simulated turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnResult {
    /// One-based index of the turn within the simulation.
    pub turn: u64,
    /// Whole-tile displacement applied to the vehicle.
    pub displacement: GridDelta,
    /// Continuous distance covered, measured in tiles.
    pub distance: f64,
    /// Fuel drawn from the tanks during the turn.
    pub fuel_spent: f64,
    /// Velocity after the turn, in hundredths of a mile per hour.
    pub velocity: f64,
    /// Safe velocity that bounded the turn.
    pub safe_velocity: f64,
    /// Whether the requested velocity had to be clamped to the safe limit.
    pub overspeed_clamped: bool,
    /// Engine state once the turn completed.
    pub engine: EngineState,
    /// Reason the engine shut down during the turn, if it did.
    pub stall: Option<StallReason>,
}

impl TurnResult {
    /// Result describing a turn in which a parked vehicle did nothing.
    #[must_use]
    pub fn parked(turn: u64, engine: EngineState) -> Self {
        Self {
            turn,
            displacement: GridDelta::ZERO,
            distance: 0.0,
            fuel_spent: 0.0,
            velocity: 0.0,
            safe_velocity: 0.0,
            overspeed_clamped: false,
            engine,
            stall: None,
        }
    }
}

/// Malformed input that prevents a simulation from starting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A terrain tag did not name any known terrain.
    #[error("unknown terrain tag `{0}`")]
    UnknownTerrain(String),
    /// No prototype with the requested identifier exists.
    #[error("unknown vehicle prototype `{0}`")]
    UnknownPrototype(PrototypeId),
    /// A prototype definition violates a physical constraint.
    #[error("malformed vehicle prototype `{id}`: {reason}")]
    MalformedPrototype {
        /// Identifier of the offending prototype.
        id: String,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// Two prototypes share an identifier.
    #[error("duplicate vehicle prototype `{0}`")]
    DuplicatePrototype(String),
    /// A terrain resistance entry is out of range.
    #[error("invalid resistance for {terrain}: {reason}")]
    InvalidTerrainCoefficient {
        /// Terrain whose entry was rejected.
        terrain: TerrainKind,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// A tuning parameter is out of range.
    #[error("invalid tuning value `{field}`: {reason}")]
    InvalidTuning {
        /// Name of the offending parameter.
        field: String,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// A configuration document could not be parsed.
    #[error("failed to parse {document}: {message}")]
    Parse {
        /// Name of the document being parsed.
        document: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A configuration document declares an unsupported format version.
    #[error("unsupported {document} version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Name of the document being parsed.
        document: String,
        /// Version found in the document.
        found: u32,
        /// Version understood by this build.
        expected: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{ConfigurationError, GridDelta, GridPosition, Heading, TerrainKind};

    #[test]
    fn chebyshev_distance_takes_longest_axis() {
        let origin = GridPosition::new(60, 60);
        assert_eq!(origin.chebyshev_distance(GridPosition::new(60, 38)), 22);
        assert_eq!(origin.chebyshev_distance(GridPosition::new(63, 55)), 5);
        assert_eq!(GridPosition::new(-2, 0).chebyshev_distance(origin), 62);
    }

    #[test]
    fn negative_ninety_degrees_faces_north() {
        assert_eq!(Heading::from_degrees(-90), Heading::North);
        assert_eq!(Heading::from_degrees(0), Heading::East);
        assert_eq!(Heading::from_degrees(90), Heading::South);
        assert_eq!(Heading::from_degrees(180), Heading::West);
        assert_eq!(Heading::from_degrees(-45), Heading::NorthEast);
        assert_eq!(Heading::from_degrees(400), Heading::SouthEast);
    }

    #[test]
    fn diagonal_displacement_keeps_chebyshev_length() {
        let origin = GridPosition::new(10, 10);
        let delta = Heading::SouthWest.displacement(7);
        assert_eq!(delta, GridDelta::new(-7, 7));
        assert_eq!(origin.chebyshev_distance(origin.offset(delta)), 7);
    }

    #[test]
    fn terrain_tags_parse_with_aliases() {
        assert_eq!("t_pavement".parse::<TerrainKind>(), Ok(TerrainKind::Pavement));
        assert_eq!("paved".parse::<TerrainKind>(), Ok(TerrainKind::Pavement));
        assert_eq!("unpaved".parse::<TerrainKind>(), Ok(TerrainKind::Dirt));
        assert_eq!(" t_dirt ".parse::<TerrainKind>(), Ok(TerrainKind::Dirt));
        for kind in TerrainKind::ALL {
            assert_eq!(kind.tag().parse::<TerrainKind>(), Ok(kind));
            assert_eq!(TerrainKind::ALL[kind.index()], kind);
        }
    }

    #[test]
    fn unknown_terrain_tag_is_a_configuration_error() {
        assert_eq!(
            "t_lava".parse::<TerrainKind>(),
            Err(ConfigurationError::UnknownTerrain("t_lava".to_owned()))
        );
    }

    #[test]
    fn grid_position_round_trips_through_bincode() {
        let position = GridPosition::new(-4, 132);
        let bytes = bincode::serialize(&position).expect("serialize");
        let restored: GridPosition = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, position);
    }
}
