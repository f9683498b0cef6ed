#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tile-grid world for the vehicle efficiency simulator.

use vehicle_efficiency_core::{Command, Event, GridPosition, Heading, TerrainKind};

const DEFAULT_ARENA_COLUMNS: u32 = 132;
const DEFAULT_ARENA_ROWS: u32 = 132;
const DEFAULT_TERRAIN: TerrainKind = TerrainKind::Pavement;

/// Where the simulated vehicle stands and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    position: GridPosition,
    heading: Heading,
}

impl Placement {
    /// Tile occupied by the vehicle.
    #[must_use]
    pub const fn position(&self) -> GridPosition {
        self.position
    }

    /// Direction the vehicle faces.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }
}

/// Represents the authoritative simulator world state.
#[derive(Debug)]
pub struct World {
    columns: u32,
    rows: u32,
    cells: Vec<TerrainKind>,
    placement: Option<Placement>,
}

impl World {
    /// Creates a paved arena with no vehicle placed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: DEFAULT_ARENA_COLUMNS,
            rows: DEFAULT_ARENA_ROWS,
            cells: uniform_cells(DEFAULT_ARENA_COLUMNS, DEFAULT_ARENA_ROWS, DEFAULT_TERRAIN),
            placement: None,
        }
    }

    fn index(&self, position: GridPosition) -> Option<usize> {
        let column = u32::try_from(position.x()).ok()?;
        let row = u32::try_from(position.y()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }

        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureArena {
            columns,
            rows,
            terrain,
        } => {
            world.columns = columns;
            world.rows = rows;
            world.cells = uniform_cells(columns, rows, terrain);
            out_events.push(Event::ArenaConfigured {
                columns,
                rows,
                terrain,
            });
        }
        Command::PaintTerrain { position, terrain } => match world.index(position) {
            Some(index) => {
                world.cells[index] = terrain;
                out_events.push(Event::TerrainPainted { position, terrain });
            }
            None => out_events.push(Event::TerrainPaintRejected { position }),
        },
        Command::PlaceVehicle { position, heading } => {
            world.placement = Some(Placement { position, heading });
            out_events.push(Event::VehiclePlaced { position, heading });
        }
        Command::DisplaceVehicle { delta } => {
            if delta.is_zero() {
                return;
            }
            if let Some(placement) = world.placement.as_mut() {
                let from = placement.position;
                placement.position = from.offset(delta);
                out_events.push(Event::VehicleDisplaced {
                    from,
                    to: placement.position,
                });
            }
        }
        Command::RecenterVehicle { position } => {
            if let Some(placement) = world.placement.as_mut() {
                let from = placement.position;
                placement.position = position;
                out_events.push(Event::VehicleRecentered { from, to: position });
            }
        }
    }
}

fn uniform_cells(columns: u32, rows: u32, terrain: TerrainKind) -> Vec<TerrainKind> {
    let count = u64::from(columns) * u64::from(rows);
    vec![terrain; usize::try_from(count).unwrap_or(0)]
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Placement, World};
    use vehicle_efficiency_core::{GridPosition, TerrainKind};

    /// Resolves the terrain of a tile, or `None` outside the arena.
    #[must_use]
    pub fn terrain_at(world: &World, position: GridPosition) -> Option<TerrainKind> {
        world
            .index(position)
            .and_then(|index| world.cells.get(index).copied())
    }

    /// Reports the vehicle placement, if a vehicle was placed.
    #[must_use]
    pub fn placement(world: &World) -> Option<Placement> {
        world.placement
    }

    /// Provides the arena dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.columns, world.rows)
    }
}
