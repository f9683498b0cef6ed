#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fuel bookkeeping for a single vehicle.
//!
//! A [`FuelSystem`] owns every tank of a vehicle and draws from them in the
//! engine's energy-source priority order. Each call to
//! [`FuelSystem::consume`] levies an idle baseline plus terms proportional to
//! engine load and distance covered. Once a draw cannot be satisfied the
//! system reports exhaustion for the rest of its lifetime.

use vehicle_efficiency_core::EnergySource;

/// Consumption coefficients of an engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BurnRates {
    /// Fuel drawn every running turn regardless of load.
    pub idle: f64,
    /// Additional fuel drawn per turn at full engine load.
    pub load: f64,
    /// Additional fuel drawn per tile travelled.
    pub distance: f64,
}

/// Storage for a single energy source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuelTank {
    source: EnergySource,
    capacity: f64,
    level: f64,
}

impl FuelTank {
    /// Creates a tank, clamping the initial level into `[0, capacity]`.
    #[must_use]
    pub fn new(source: EnergySource, capacity: f64, level: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            source,
            capacity,
            level: level.max(0.0).min(capacity),
        }
    }

    /// Energy source stored in the tank.
    #[must_use]
    pub const fn source(&self) -> EnergySource {
        self.source
    }

    /// Maximum amount the tank can hold.
    #[must_use]
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Amount currently held.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }
}

/// Amount requested from and delivered by a single draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuelDraw {
    /// Fuel the engine asked for.
    pub requested: f64,
    /// Fuel the tanks delivered.
    pub spent: f64,
}

impl FuelDraw {
    /// Portion of the request the tanks could not cover.
    #[must_use]
    pub fn shortfall(&self) -> f64 {
        (self.requested - self.spent).max(0.0)
    }
}

/// Tracks remaining fuel per tank and reports exhaustion.
#[derive(Clone, Debug)]
pub struct FuelSystem {
    tanks: Vec<FuelTank>,
    draw_order: Vec<usize>,
    rates: BurnRates,
    exhausted: bool,
}

impl FuelSystem {
    /// Creates a fuel system drawing from tanks in the given source priority.
    ///
    /// Tanks whose source does not appear in `priority` are kept but never
    /// drawn from. Tanks sharing a source are drawn in declaration order.
    #[must_use]
    pub fn new(tanks: Vec<FuelTank>, priority: &[EnergySource], rates: BurnRates) -> Self {
        let mut draw_order = Vec::with_capacity(tanks.len());
        for (rank, source) in priority.iter().enumerate() {
            if priority[..rank].contains(source) {
                continue;
            }
            draw_order.extend(
                tanks
                    .iter()
                    .enumerate()
                    .filter(|(_, tank)| tank.source == *source)
                    .map(|(index, _)| index),
            );
        }

        Self {
            tanks,
            draw_order,
            rates,
            exhausted: false,
        }
    }

    /// Fuel a turn with the given load and distance would request.
    ///
    /// Load is clamped into `[0, 1]` and distance is floored at zero, which
    /// keeps the demand monotone in both arguments.
    #[must_use]
    pub fn demand(&self, engine_load: f64, distance: f64) -> f64 {
        self.rates.idle + self.rates.load * unit_interval(engine_load)
            + self.rates.distance * distance.max(0.0)
    }

    /// Draws one turn's worth of fuel.
    ///
    /// Levels never drop below zero. A shortfall marks the system exhausted
    /// from this call onward.
    pub fn consume(&mut self, engine_load: f64, distance: f64) -> FuelDraw {
        let requested = self.demand(engine_load, distance);
        let mut outstanding = requested;

        for &index in &self.draw_order {
            if outstanding <= 0.0 {
                break;
            }
            let tank = &mut self.tanks[index];
            let taken = outstanding.min(tank.level);
            tank.level -= taken;
            outstanding -= taken;
        }

        if outstanding > 0.0 {
            self.exhausted = true;
        }

        FuelDraw {
            requested,
            spent: requested - outstanding,
        }
    }

    /// Reports whether a draw has ever gone unsatisfied.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fuel left across every burnable tank.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.draw_order
            .iter()
            .map(|&index| self.tanks[index].level)
            .sum()
    }

    /// Fuel left in tanks of the given source, burnable or not.
    #[must_use]
    pub fn remaining_of(&self, source: EnergySource) -> f64 {
        self.tanks
            .iter()
            .filter(|tank| tank.source == source)
            .map(FuelTank::level)
            .sum()
    }

    /// Combined capacity of every burnable tank.
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.draw_order
            .iter()
            .map(|&index| self.tanks[index].capacity)
            .sum()
    }

    /// Every tank in declaration order.
    #[must_use]
    pub fn tanks(&self) -> &[FuelTank] {
        &self.tanks
    }

    /// Consumption coefficients of the engine.
    #[must_use]
    pub const fn rates(&self) -> BurnRates {
        self.rates
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
