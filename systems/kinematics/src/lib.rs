#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Vehicle kinematics: safe velocity limits, velocity integration and tile travel.
//!
//! Velocities are expressed in hundredths of a mile per hour. Every operation
//! is a pure transition from one [`MotionState`] to the next; the caller owns
//! the state and decides when to commit it.

use serde::Deserialize;
use vehicle_efficiency_core::ConfigurationError;

/// Tunable coefficients of the kinematics model.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KinematicsTuning {
    /// Velocity reached per square root of watts per kilogram.
    pub power_speed_scale: f64,
    /// Velocity gained per turn per watt of power per kilogram of mass.
    pub accel_scale: f64,
    /// Scale of the velocity-squared drag loss per turn.
    pub drag_scale: f64,
    /// Velocity shed per turn when braking toward a lower target.
    pub brake_decel: f64,
    /// Velocity permitted on terrain with a safe speed modifier of one.
    pub terrain_reference_velocity: f64,
    /// Velocity that covers exactly one tile per turn.
    pub velocity_per_tile: f64,
}

impl Default for KinematicsTuning {
    fn default() -> Self {
        Self {
            power_speed_scale: 1_000.0,
            accel_scale: 20.0,
            drag_scale: 1.0e-5,
            brake_decel: 1_000.0,
            terrain_reference_velocity: 12_000.0,
            velocity_per_tile: 400.0,
        }
    }
}

impl KinematicsTuning {
    /// Checks that every coefficient keeps the model convergent.
    pub fn validate(self) -> Result<Self, ConfigurationError> {
        let positive = [
            ("power_speed_scale", self.power_speed_scale),
            ("accel_scale", self.accel_scale),
            ("terrain_reference_velocity", self.terrain_reference_velocity),
            ("velocity_per_tile", self.velocity_per_tile),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, "must be finite and positive"));
            }
        }

        let non_negative = [
            ("drag_scale", self.drag_scale),
            ("brake_decel", self.brake_decel),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be finite and non-negative"));
            }
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

/// Physical parameters of a vehicle that drive its kinematics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleSpec {
    /// Total mass in kilograms.
    pub mass_kg: f64,
    /// Engine power in watts.
    pub power_w: f64,
    /// Velocity the frame and wheels are rated for.
    pub max_velocity: f64,
    /// Relative frontal drag of the body.
    pub drag_area: f64,
}

/// Velocity state carried from one turn to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionState {
    velocity: f64,
    last_delta: f64,
    momentum_carry: f64,
}

impl MotionState {
    /// State of a vehicle standing still with nothing carried over.
    #[must_use]
    pub const fn at_rest() -> Self {
        Self {
            velocity: 0.0,
            last_delta: 0.0,
            momentum_carry: 0.0,
        }
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Velocity change applied during the previous turn.
    #[must_use]
    pub const fn last_delta(&self) -> f64 {
        self.last_delta
    }

    /// Fraction of a tile of movement owed from earlier turns.
    #[must_use]
    pub const fn momentum_carry(&self) -> f64 {
        self.momentum_carry
    }

    /// Caps the velocity at `limit`, reporting whether the cap engaged.
    #[must_use]
    pub fn clamped(self, limit: f64) -> (Self, bool) {
        let limit = limit.max(0.0);
        if self.velocity <= limit {
            return (self, false);
        }

        let excess = self.velocity - limit;
        let clamped = Self {
            velocity: limit,
            last_delta: self.last_delta - excess,
            momentum_carry: self.momentum_carry,
        };
        (clamped, true)
    }
}

/// Outcome of integrating velocity over one turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advance {
    /// Motion state after the turn.
    pub state: MotionState,
    /// Fraction of engine power spent during the turn.
    pub engine_load: f64,
}

impl Advance {
    /// Velocity change produced by the turn.
    #[must_use]
    pub const fn velocity_delta(&self) -> f64 {
        self.state.last_delta
    }
}

/// Whole tiles covered during one turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Travel {
    /// Whole tiles to move along the heading.
    pub tiles: i32,
    /// Continuous distance covered, measured in tiles.
    pub distance: f64,
    /// Motion state with the updated movement remainder.
    pub state: MotionState,
}

/// Pure kinematics model parameterised by [`KinematicsTuning`].
#[derive(Clone, Debug, Default)]
pub struct VehicleKinematics {
    tuning: KinematicsTuning,
}

impl VehicleKinematics {
    /// Creates a model using the provided tuning.
    #[must_use]
    pub const fn new(tuning: KinematicsTuning) -> Self {
        Self { tuning }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn tuning(&self) -> &KinematicsTuning {
        &self.tuning
    }

    /// Highest velocity the vehicle may hold on terrain with the given modifier.
    ///
    /// This is the lesser of the structural limit (frame rating or the speed
    /// the engine can sustain for its mass) and the terrain limit. Vehicles
    /// without power or mass, and impassable terrain, yield zero.
    #[must_use]
    pub fn safe_velocity(&self, spec: &VehicleSpec, terrain_modifier: f64) -> f64 {
        if !(spec.power_w > 0.0) || !(spec.mass_kg > 0.0) {
            return 0.0;
        }

        let power_limited = self.tuning.power_speed_scale * (spec.power_w / spec.mass_kg).sqrt();
        let structural = spec.max_velocity.min(power_limited);
        let terrain_limit = self.tuning.terrain_reference_velocity * terrain_modifier.max(0.0);
        structural.min(terrain_limit).max(0.0)
    }

    /// Velocity the engine can add in one turn from a standstill.
    #[must_use]
    pub fn acceleration(&self, spec: &VehicleSpec) -> f64 {
        if !(spec.mass_kg > 0.0) {
            return 0.0;
        }
        self.tuning.accel_scale * spec.power_w.max(0.0) / spec.mass_kg
    }

    /// Velocity lost to drag in one turn.
    #[must_use]
    pub fn drag_loss(&self, spec: &VehicleSpec, drag_coefficient: f64, velocity: f64) -> f64 {
        self.tuning.drag_scale * drag_coefficient * spec.drag_area * velocity * velocity
    }

    /// Velocity at which drag cancels the engine's acceleration.
    #[must_use]
    pub fn equilibrium_velocity(&self, spec: &VehicleSpec, drag_coefficient: f64) -> f64 {
        let resistance = self.tuning.drag_scale * drag_coefficient * spec.drag_area;
        if resistance > 0.0 {
            (self.acceleration(spec) / resistance).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Moves velocity one turn toward `min(cruise, safe)`.
    ///
    /// Below the target the engine accelerates with whatever power drag leaves
    /// over. When drag outweighs the engine the vehicle slows toward the drag
    /// equilibrium but never below it. Above the target the vehicle brakes
    /// without overshooting. The movement remainder passes through untouched.
    #[must_use]
    pub fn advance(
        &self,
        spec: &VehicleSpec,
        motion: &MotionState,
        cruise: f64,
        drag_coefficient: f64,
        safe: f64,
    ) -> Advance {
        let target = cruise.min(safe).max(0.0);
        let velocity = motion.velocity;
        let acceleration = self.acceleration(spec);
        let drag_loss = self.drag_loss(spec, drag_coefficient, velocity);

        let (next, load) = if velocity <= target {
            let net = acceleration - drag_loss;
            if net >= 0.0 {
                let applied = net.min(target - velocity);
                let load = if acceleration > 0.0 {
                    (drag_loss + applied) / acceleration
                } else {
                    0.0
                };
                (velocity + applied, load)
            } else {
                let floor = self.equilibrium_velocity(spec, drag_coefficient);
                ((velocity + net).max(floor), 1.0)
            }
        } else {
            let braked = velocity - (self.tuning.brake_decel + drag_loss);
            (braked.max(target), 0.0)
        };

        let next = next.max(0.0);
        Advance {
            state: MotionState {
                velocity: next,
                last_delta: next - velocity,
                momentum_carry: motion.momentum_carry,
            },
            engine_load: load.clamp(0.0, 1.0),
        }
    }

    /// Converts the current velocity into whole tiles of movement.
    ///
    /// The fractional part of a tile is carried to the next turn so that slow
    /// vehicles still make progress.
    #[must_use]
    pub fn travel(&self, motion: &MotionState) -> Travel {
        let distance = motion.velocity / self.tuning.velocity_per_tile;
        let budget = distance + motion.momentum_carry;
        let whole = budget.floor();

        Travel {
            tiles: whole as i32,
            distance,
            state: MotionState {
                momentum_carry: budget - whole,
                ..*motion
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KinematicsTuning, MotionState, VehicleKinematics, VehicleSpec};
    use approx::assert_relative_eq;
    use vehicle_efficiency_core::ConfigurationError;

    const CAR: VehicleSpec = VehicleSpec {
        mass_kg: 1_500.0,
        power_w: 100_000.0,
        max_velocity: 8_000.0,
        drag_area: 1.0,
    };

    #[test]
    fn safe_velocity_is_lesser_of_structural_and_terrain_limits() {
        let kinematics = VehicleKinematics::default();
        assert_relative_eq!(kinematics.safe_velocity(&CAR, 1.0), 8_000.0);
        assert_relative_eq!(kinematics.safe_velocity(&CAR, 0.45), 5_400.0);

        let weak = VehicleSpec {
            power_w: 15_000.0,
            ..CAR
        };
        assert_relative_eq!(
            kinematics.safe_velocity(&weak, 1.0),
            1_000.0 * 10.0_f64.sqrt()
        );
    }

    #[test]
    fn safe_velocity_is_positive_for_any_powered_vehicle() {
        let kinematics = VehicleKinematics::default();
        let feeble = VehicleSpec {
            mass_kg: 40_000.0,
            power_w: 1.0,
            ..CAR
        };
        assert!(kinematics.safe_velocity(&feeble, 0.25) > 0.0);

        let unpowered = VehicleSpec {
            power_w: 0.0,
            ..CAR
        };
        assert_eq!(kinematics.safe_velocity(&unpowered, 1.0), 0.0);
        assert_eq!(kinematics.safe_velocity(&CAR, 0.0), 0.0);
    }

    #[test]
    fn first_turn_from_rest_uses_full_power() {
        let kinematics = VehicleKinematics::default();
        let advance = kinematics.advance(&CAR, &MotionState::at_rest(), 8_000.0, 1.0, 8_000.0);
        assert_relative_eq!(advance.state.velocity(), 20.0 * 100_000.0 / 1_500.0);
        assert_relative_eq!(advance.velocity_delta(), advance.state.velocity());
        assert_relative_eq!(advance.engine_load, 1.0);
    }

    #[test]
    fn repeated_advance_converges_on_target_without_overshoot() {
        let kinematics = VehicleKinematics::default();
        let mut motion = MotionState::at_rest();
        let mut previous = 0.0;
        for _ in 0..30 {
            let advance = kinematics.advance(&CAR, &motion, 8_000.0, 1.0, 8_000.0);
            motion = advance.state;
            assert!(motion.velocity() >= previous, "velocity must not oscillate");
            assert!(motion.velocity() <= 8_000.0);
            previous = motion.velocity();
        }
        assert_relative_eq!(motion.velocity(), 8_000.0);

        let cruising = kinematics.advance(&CAR, &motion, 8_000.0, 1.0, 8_000.0);
        assert_relative_eq!(cruising.velocity_delta(), 0.0);
        assert_relative_eq!(
            cruising.engine_load,
            640.0 / (20.0 * 100_000.0 / 1_500.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn heavy_drag_settles_on_equilibrium() {
        let kinematics = VehicleKinematics::default();
        let drag = 40.0;
        let equilibrium = kinematics.equilibrium_velocity(&CAR, drag);
        assert!(equilibrium < 8_000.0);

        let mut motion = MotionState::at_rest();
        for _ in 0..20 {
            motion = kinematics
                .advance(&CAR, &motion, 8_000.0, drag, 8_000.0)
                .state;
            assert!(motion.velocity() <= 8_000.0);
        }
        assert_relative_eq!(motion.velocity(), equilibrium, max_relative = 1e-9);
    }

    #[test]
    fn drag_loss_grows_with_coefficient_and_velocity() {
        let kinematics = VehicleKinematics::default();
        assert!(kinematics.drag_loss(&CAR, 4.0, 3_000.0) > kinematics.drag_loss(&CAR, 1.0, 3_000.0));
        assert!(kinematics.drag_loss(&CAR, 1.0, 6_000.0) > kinematics.drag_loss(&CAR, 1.0, 3_000.0));
    }

    #[test]
    fn lower_target_brakes_without_engine_load() {
        let kinematics = VehicleKinematics::default();
        let mut motion = MotionState::at_rest();
        for _ in 0..30 {
            motion = kinematics
                .advance(&CAR, &motion, 8_000.0, 1.0, 8_000.0)
                .state;
        }

        let braking = kinematics.advance(&CAR, &motion, 2_000.0, 1.0, 8_000.0);
        assert_relative_eq!(
            braking.state.velocity(),
            8_000.0 - 1_000.0 - 640.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(braking.engine_load, 0.0);

        let stopped = kinematics.advance(&CAR, &braking.state, 6_500.0, 1.0, 8_000.0);
        assert_relative_eq!(stopped.state.velocity(), 6_500.0);
    }

    #[test]
    fn slow_vehicles_accumulate_partial_tiles() {
        let kinematics = VehicleKinematics::default();
        let crawling = VehicleSpec {
            mass_kg: 1_000.0,
            power_w: 10_000.0,
            max_velocity: 100.0,
            drag_area: 1.0,
        };
        let mut motion = MotionState::at_rest();
        for _ in 0..10 {
            motion = kinematics
                .advance(&crawling, &motion, 100.0, 1.0, 100.0)
                .state;
        }
        assert_relative_eq!(motion.velocity(), 100.0);

        let tiles: Vec<i32> = (0..8)
            .map(|_| {
                let travel = kinematics.travel(&motion);
                motion = travel.state;
                travel.tiles
            })
            .collect();
        assert_eq!(tiles, vec![0, 0, 0, 1, 0, 0, 0, 1]);
        assert_relative_eq!(motion.momentum_carry(), 0.0);
    }

    #[test]
    fn clamping_reports_and_caps_overspeed() {
        let kinematics = VehicleKinematics::default();
        let mut motion = MotionState::at_rest();
        for _ in 0..30 {
            motion = kinematics
                .advance(&CAR, &motion, 8_000.0, 1.0, 8_000.0)
                .state;
        }

        let (capped, engaged) = motion.clamped(5_400.0);
        assert!(engaged);
        assert_relative_eq!(capped.velocity(), 5_400.0);

        let (untouched, engaged) = capped.clamped(5_400.0);
        assert!(!engaged);
        assert_eq!(untouched, capped);
    }

    #[test]
    fn at_rest_clears_every_field() {
        let rest = MotionState::at_rest();
        assert_eq!(rest, MotionState::default());
        assert_eq!(rest.velocity(), 0.0);
        assert_eq!(rest.last_delta(), 0.0);
        assert_eq!(rest.momentum_carry(), 0.0);
    }

    #[test]
    fn tuning_rejects_non_positive_tile_velocity() {
        let tuning = KinematicsTuning {
            velocity_per_tile: 0.0,
            ..KinematicsTuning::default()
        };
        assert_eq!(
            tuning.validate(),
            Err(ConfigurationError::InvalidTuning {
                field: "velocity_per_tile".to_owned(),
                reason: "must be finite and positive".to_owned(),
            })
        );
        assert!(KinematicsTuning::default().validate().is_ok());
    }
}
