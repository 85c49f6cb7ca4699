//! Tunable gameplay constants.
//!
//! Defaults are authored in meters and seconds; `pixels_per_meter` converts
//! lengths for the solver (see `Tunables::meters`).

use bevy::prelude::*;
use serde::Deserialize;

use crate::common::error::{ConfigError, TrajectoryError};

#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    /// Downward gravity, m/s².
    pub gravity: f32,
    pub player: PlayerTunables,
    pub bow: BowTunables,
    pub arrow: ArrowTunables,
    pub chain: ChainTunables,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerTunables {
    pub speed: f32,
    pub jump_speed: f32,
    /// Horizontal speed change while grounded, m/s².
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    pub max_hp: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BowTunables {
    /// Seconds of charging to reach `max_power`.
    pub charge_time: f32,
    pub max_power: f32,
    /// Distance from the archer's centre to the arrow spawn point, m.
    pub spawn_offset: f32,
    pub trajectory_point_count: u32,
    pub trajectory_point_time: f64,
    /// Preview dash period, m.
    pub dot_spacing: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArrowTunables {
    /// Launch impulse at full power, kg·m/s.
    pub fire_force: f32,
    pub mass: f32,
    pub gravity_scale: f32,
    pub grace_period: f32,
    pub damage: u32,
    /// Upward speed given to bodies landing on a springboard arrow, m/s.
    pub bounce_speed: f32,
    pub rebound_restitution: f32,
    pub rebound_min_speed: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainTunables {
    pub link_length: f32,
    pub link_width: f32,
    pub link_mass: f32,
    pub initial_pool_size: usize,
    /// Joint swing limit either side of straight, degrees.
    pub max_joint_angle: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            gravity: 9.81,
            player: PlayerTunables::default(),
            bow: BowTunables::default(),
            arrow: ArrowTunables::default(),
            chain: ChainTunables::default(),
        }
    }
}

impl Default for PlayerTunables {
    fn default() -> Self {
        Self { speed: 6.0, jump_speed: 9.0, ground_acceleration: 40.0, air_acceleration: 15.0, max_hp: 100 }
    }
}

impl Default for BowTunables {
    fn default() -> Self {
        Self {
            charge_time: 0.5,
            max_power: 1.0,
            spawn_offset: 0.9,
            trajectory_point_count: 20,
            trajectory_point_time: 0.1,
            dot_spacing: 0.25,
        }
    }
}

impl Default for ArrowTunables {
    fn default() -> Self {
        Self {
            fire_force: 20.0,
            mass: 1.0,
            gravity_scale: 1.0,
            grace_period: 0.15,
            damage: 100,
            bounce_speed: 10.0,
            rebound_restitution: 0.8,
            rebound_min_speed: 4.0,
        }
    }
}

impl Default for ChainTunables {
    fn default() -> Self {
        Self {
            link_length: 0.5,
            link_width: 0.2,
            link_mass: 1.0,
            initial_pool_size: 20,
            max_joint_angle: 45.0,
        }
    }
}

/// Strictly positive and finite; NaN fails the comparison.
fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value: value as f64 })
    }
}

impl Tunables {
    /// Parse tunables from RON; missing fields keep their defaults.
    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        let tunables: Self = ron::from_str(src)?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bow.trajectory_point_count == 0 {
            return Err(TrajectoryError::ZeroSampleCount.into());
        }
        if self.bow.trajectory_point_count > 50 {
            return Err(ConfigError::OutOfRange {
                field: "bow.trajectory_point_count",
                value: self.bow.trajectory_point_count as f64,
            });
        }
        if !(self.bow.trajectory_point_time > 0.0 && self.bow.trajectory_point_time.is_finite()) {
            return Err(TrajectoryError::NonPositiveTimeStep(self.bow.trajectory_point_time).into());
        }
        if !(self.bow.dot_spacing > 0.0 && self.bow.dot_spacing.is_finite()) {
            return Err(TrajectoryError::NonPositiveDotSpacing(self.bow.dot_spacing).into());
        }
        if !(0.1..=3.0).contains(&self.bow.max_power) {
            return Err(ConfigError::OutOfRange { field: "bow.max_power", value: self.bow.max_power as f64 });
        }
        if self.player.max_hp == 0 {
            return Err(ConfigError::OutOfRange { field: "player.max_hp", value: 0.0 });
        }
        positive("pixels_per_meter", self.pixels_per_meter)?;
        positive("bow.charge_time", self.bow.charge_time)?;
        positive("arrow.mass", self.arrow.mass)?;
        positive("chain.link_length", self.chain.link_length)?;
        positive("chain.link_width", self.chain.link_width)?;
        positive("chain.link_mass", self.chain.link_mass)?;

        let rest = [
            ("gravity", self.gravity),
            ("player.speed", self.player.speed),
            ("player.jump_speed", self.player.jump_speed),
            ("player.ground_acceleration", self.player.ground_acceleration),
            ("player.air_acceleration", self.player.air_acceleration),
            ("bow.spawn_offset", self.bow.spawn_offset),
            ("arrow.fire_force", self.arrow.fire_force),
            ("arrow.gravity_scale", self.arrow.gravity_scale),
            ("arrow.grace_period", self.arrow.grace_period),
            ("arrow.bounce_speed", self.arrow.bounce_speed),
            ("arrow.rebound_restitution", self.arrow.rebound_restitution),
            ("arrow.rebound_min_speed", self.arrow.rebound_min_speed),
            ("chain.max_joint_angle", self.chain.max_joint_angle),
        ];
        for (field, value) in rest {
            if !value.is_finite() {
                return Err(ConfigError::OutOfRange { field, value: value as f64 });
            }
        }
        Ok(())
    }

    /// Convert a length in meters to solver units.
    #[inline]
    pub fn meters(&self, m: f32) -> f32 {
        m * self.pixels_per_meter
    }
}
