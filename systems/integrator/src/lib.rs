#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn integrator driving a single vehicle across the world.
//!
//! Each running turn resolves the terrain beneath the vehicle, advances its
//! velocity, converts velocity into whole-tile displacement, burns fuel and
//! finally decides whether the engine keeps running. All state lives in an
//! explicit [`Simulation`] context and the [`Vehicle`] it created.

use std::vec::Drain;

use log::{debug, trace};
use vehicle_efficiency_core::{
    Command, ConfigurationError, EngineState, Event, GridPosition, Heading, PrototypeId,
    StallReason, TerrainKind, TurnResult,
};
use vehicle_efficiency_prototypes::PrototypeCatalog;
use vehicle_efficiency_system_fuel::{BurnRates, FuelSystem, FuelTank};
use vehicle_efficiency_system_kinematics::{MotionState, VehicleKinematics, VehicleSpec};
use vehicle_efficiency_system_terrain::TerrainResistanceModel;
use vehicle_efficiency_world::{self as world, query, World};

/// Context owning the world and the models a trial runs against.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    terrain: TerrainResistanceModel,
    kinematics: VehicleKinematics,
    catalog: PrototypeCatalog,
    events: Vec<Event>,
    turn: u64,
}

impl Simulation {
    /// Creates a simulation over the default paved arena.
    #[must_use]
    pub fn new(
        catalog: PrototypeCatalog,
        terrain: TerrainResistanceModel,
        kinematics: VehicleKinematics,
    ) -> Self {
        Self {
            world: World::new(),
            terrain,
            kinematics,
            catalog,
            events: Vec::new(),
            turn: 0,
        }
    }

    /// Applies a world command and journals the resulting events.
    pub fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    /// Moves the vehicle to `position` without touching its motion or fuel.
    pub fn recenter(&mut self, position: GridPosition) {
        self.apply(Command::RecenterVehicle { position });
    }

    /// Removes and yields every journaled world event.
    pub fn drain_events(&mut self) -> Drain<'_, Event> {
        self.events.drain(..)
    }

    /// World the vehicle moves through.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Terrain resistance table in use.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainResistanceModel {
        &self.terrain
    }

    /// Kinematics model in use.
    #[must_use]
    pub const fn kinematics(&self) -> &VehicleKinematics {
        &self.kinematics
    }

    /// Prototypes vehicles are created from.
    #[must_use]
    pub const fn catalog(&self) -> &PrototypeCatalog {
        &self.catalog
    }

    /// Number of turns stepped so far.
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    fn current_terrain(&self) -> Option<TerrainKind> {
        let placement = query::placement(&self.world)?;
        query::terrain_at(&self.world, placement.position())
    }

    fn safe_velocity_here(&self, spec: &VehicleSpec) -> Option<f64> {
        let terrain = self.current_terrain()?;
        let modifier = self.terrain.resistance(terrain).safe_speed_modifier;
        Some(self.kinematics.safe_velocity(spec, modifier))
    }
}

/// Mutable state of the simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    prototype: PrototypeId,
    spec: VehicleSpec,
    heading: Heading,
    motion: MotionState,
    cruise_velocity: f64,
    engine: EngineState,
    stall: Option<StallReason>,
    fuel: FuelSystem,
}

impl Vehicle {
    /// Prototype the vehicle was created from.
    #[must_use]
    pub const fn prototype(&self) -> &PrototypeId {
        &self.prototype
    }

    /// Physical parameters driving the kinematics.
    #[must_use]
    pub const fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    /// Direction of travel.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Current motion state.
    #[must_use]
    pub const fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> f64 {
        self.motion.velocity()
    }

    /// Velocity the driver aims for.
    #[must_use]
    pub const fn cruise_velocity(&self) -> f64 {
        self.cruise_velocity
    }

    /// Engine lifecycle state.
    #[must_use]
    pub const fn engine(&self) -> EngineState {
        self.engine
    }

    /// Reason the engine stalled, once it has.
    #[must_use]
    pub const fn stall_reason(&self) -> Option<StallReason> {
        self.stall
    }

    /// Fuel tanks and burn rates.
    #[must_use]
    pub const fn fuel(&self) -> &FuelSystem {
        &self.fuel
    }

    fn stall(&mut self, reason: StallReason) {
        self.engine = EngineState::Stalled;
        self.stall = Some(reason);
        self.motion = MotionState::at_rest();
    }
}

/// Creates a vehicle with tanks at their prototype fill level.
///
/// A simulation tracks one placement, so creating another vehicle moves the
/// placement to the newcomer and leaves earlier vehicles off the grid.
pub fn create_vehicle(
    sim: &mut Simulation,
    prototype: &PrototypeId,
    position: GridPosition,
    heading: Heading,
) -> Result<Vehicle, ConfigurationError> {
    create_vehicle_with_fuel(sim, prototype, position, heading, 1.0)
}

/// Creates a vehicle, scaling every tank's fill level by `fuel_fraction`.
///
/// The vehicle is placed at `position` facing `heading`, at rest with its
/// engine idle, replacing any placement made for an earlier vehicle. The
/// fraction is clamped into `[0, 1]`.
pub fn create_vehicle_with_fuel(
    sim: &mut Simulation,
    prototype: &PrototypeId,
    position: GridPosition,
    heading: Heading,
    fuel_fraction: f64,
) -> Result<Vehicle, ConfigurationError> {
    let definition = sim.catalog.get(prototype)?;
    let fraction = if fuel_fraction.is_nan() {
        0.0
    } else {
        fuel_fraction.clamp(0.0, 1.0)
    };

    let tanks = definition
        .tanks
        .iter()
        .map(|tank| FuelTank::new(tank.source, tank.capacity, tank.capacity * tank.fill * fraction))
        .collect();
    let rates = BurnRates {
        idle: definition.engine.idle_burn,
        load: definition.engine.load_burn,
        distance: definition.engine.distance_burn,
    };
    let vehicle = Vehicle {
        prototype: definition.id.clone(),
        spec: VehicleSpec {
            mass_kg: definition.mass_kg,
            power_w: definition.engine.power_w,
            max_velocity: definition.max_velocity,
            drag_area: definition.drag_area,
        },
        heading,
        motion: MotionState::at_rest(),
        cruise_velocity: 0.0,
        engine: EngineState::Idle,
        stall: None,
        fuel: FuelSystem::new(tanks, &definition.engine.sources, rates),
    };

    sim.apply(Command::PlaceVehicle { position, heading });
    debug!(
        "created {} at ({}, {}) with {:.1} of {:.1} fuel",
        vehicle.prototype,
        position.x(),
        position.y(),
        vehicle.fuel.remaining(),
        vehicle.fuel.capacity()
    );
    Ok(vehicle)
}

/// Turns an idle engine on. Returns whether the engine started.
pub fn start_engine(vehicle: &mut Vehicle) -> bool {
    if vehicle.engine != EngineState::Idle {
        return false;
    }
    vehicle.engine = EngineState::Running;
    true
}

/// Sets the velocity the driver aims for. Negative or NaN targets become zero.
pub fn set_cruise(vehicle: &mut Vehicle, target: f64) {
    vehicle.cruise_velocity = target.max(0.0);
}

/// Brings the vehicle to a full stop, leaving fuel and engine untouched.
pub fn force_reset_motion(vehicle: &mut Vehicle) {
    vehicle.motion = MotionState::at_rest();
}

/// Reports whether the engine is running.
#[must_use]
pub fn is_running(vehicle: &Vehicle) -> bool {
    vehicle.engine == EngineState::Running
}

/// Safe velocity on the vehicle's current tile, zero when off the grid.
#[must_use]
pub fn safe_velocity(sim: &Simulation, vehicle: &Vehicle) -> f64 {
    sim.safe_velocity_here(&vehicle.spec).unwrap_or(0.0)
}

/// Advances the vehicle by one turn.
///
/// Engines that are not running yield a parked result. A running engine
/// stalls when fuel runs out, when the tile it reaches has no safe velocity,
/// or when the vehicle leaves the grid.
pub fn step_turn(sim: &mut Simulation, vehicle: &mut Vehicle) -> TurnResult {
    sim.turn += 1;
    let turn = sim.turn;

    if vehicle.engine != EngineState::Running {
        return TurnResult::parked(turn, vehicle.engine);
    }

    let Some(terrain) = sim.current_terrain() else {
        let parked = TurnResult::parked(turn, vehicle.engine);
        return stalled(vehicle, parked, StallReason::OffGrid);
    };
    let resistance = sim.terrain.resistance(terrain);
    let safe = sim
        .kinematics
        .safe_velocity(&vehicle.spec, resistance.safe_speed_modifier);

    let advance = sim.kinematics.advance(
        &vehicle.spec,
        &vehicle.motion,
        vehicle.cruise_velocity,
        resistance.drag_coefficient,
        safe,
    );
    let (motion, overspeed_clamped) = advance.state.clamped(safe);
    if overspeed_clamped {
        debug!(
            "turn {turn}: {} clamped from {:.1} to safe velocity {safe:.1} on {terrain}",
            vehicle.prototype,
            advance.state.velocity()
        );
    }

    let travel = sim.kinematics.travel(&motion);
    vehicle.motion = travel.state;
    let displacement = vehicle.heading.displacement(travel.tiles);
    sim.apply(Command::DisplaceVehicle {
        delta: displacement,
    });

    let draw = vehicle.fuel.consume(advance.engine_load, travel.distance);
    trace!(
        "turn {turn}: velocity {:.1}, {} tiles, load {:.3}, fuel {:.2}",
        vehicle.motion.velocity(),
        travel.tiles,
        advance.engine_load,
        draw.spent
    );

    let result = TurnResult {
        turn,
        displacement,
        distance: travel.distance,
        fuel_spent: draw.spent,
        velocity: vehicle.motion.velocity(),
        safe_velocity: safe,
        overspeed_clamped,
        engine: vehicle.engine,
        stall: None,
    };

    let stall = if vehicle.fuel.is_exhausted() {
        Some(StallReason::FuelExhausted)
    } else {
        match sim.safe_velocity_here(&vehicle.spec) {
            None => Some(StallReason::OffGrid),
            Some(next_safe) if next_safe <= 0.0 => Some(StallReason::NoSafeVelocity),
            Some(_) => None,
        }
    };

    match stall {
        Some(reason) => stalled(vehicle, result, reason),
        None => result,
    }
}

fn stalled(vehicle: &mut Vehicle, result: TurnResult, reason: StallReason) -> TurnResult {
    debug!(
        "turn {}: {} stalled ({reason:?})",
        result.turn, vehicle.prototype
    );
    vehicle.stall(reason);
    TurnResult {
        velocity: vehicle.velocity(),
        engine: vehicle.engine,
        stall: Some(reason),
        ..result
    }
}
