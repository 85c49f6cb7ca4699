//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::projectiles::ProjectilesPlugin;

pub mod bow;
pub mod core;
pub mod physics;
pub mod player;
pub mod projectiles;
pub mod tutorial;
pub mod world;

// Render-only
pub mod camera;
pub mod preview;

/// Register gameplay plugins that work in headless tests.
///
/// `core` goes first: `physics` reads `Tunables` while building.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    world::plugin(app);
    player::plugin(app);
    app.add_plugins(ProjectilesPlugin);
    bow::plugin(app);
    tutorial::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
    preview::plugin(app);
}
