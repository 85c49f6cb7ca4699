//! Error types shared across plugins.

use bevy::prelude::Entity;
use thiserror::Error;

/// Rejected trajectory sampler configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    #[error("trajectory sample count must be at least 1")]
    ZeroSampleCount,
    #[error("trajectory time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("trajectory dot spacing must be positive, got {0}")]
    NonPositiveDotSpacing(f64),
}

/// Failure while loading tunables or level data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid trajectory settings: {0}")]
    Trajectory(#[from] TrajectoryError),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("level not found: {0}")]
    UnknownLevel(String),
}

/// Misuse of an entity pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("entity {0:?} is not checked out of this pool")]
    NotCheckedOut(Entity),
}
