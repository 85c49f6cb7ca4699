//! Physics plugin: avian2d at the configured length unit, gravity down.
//!
//! Must be registered after `core`, which inserts `Tunables`.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    let tunables = app.world().resource::<Tunables>();
    let ppm = tunables.pixels_per_meter;
    let gravity = world_gravity(tunables);

    app.add_plugins(PhysicsPlugins::default().with_length_unit(ppm));
    app.insert_resource(Gravity(gravity));
}

/// Solver gravity in pixels/s².
pub fn world_gravity(tunables: &Tunables) -> Vec2 {
    Vec2::NEG_Y * tunables.meters(tunables.gravity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_points_down_in_pixels() {
        let t = Tunables::default();
        let g = world_gravity(&t);
        assert_eq!(g.x, 0.0);
        assert!((g.y + 196.2).abs() < 1e-3);
    }
}
