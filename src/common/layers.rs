//! Collision layers.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    /// Stone walls and floors: arrows never stick to these.
    World,
    /// Wooden surfaces that arrows embed into.
    ArrowSurface,
    Player,
    Arrow,
    ChainLink,
    /// Loose dynamic props (balls, crates) that springboard arrows launch.
    Prop,
    /// Sensors: the ball goal, the level exit and wind areas.
    Trigger,
}

/// Layers the trajectory preview traces against.
pub fn trajectory_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::ArrowSurface, Layer::Player, Layer::Arrow, Layer::Prop])
}

/// Layers that block a chain from being strung between two arrows.
pub fn chain_validity_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::ArrowSurface])
}
