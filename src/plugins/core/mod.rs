//! Core plugin: shared resources, bundled config and level bookkeeping.
//!
//! Config ships inside the binary; a malformed file falls back to defaults
//! with a warning rather than refusing to start.
//!
//! ```text
//!   InGame ──exit reached / N──► LevelComplete ──next_level──► InGame (next)
//!   InGame ──archer died──► Respawning ──► InGame (same level)
//! ```

use bevy::prelude::*;

use crate::common::level::{CurrentLevel, LevelConfig, LevelData};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::projectiles::pool;

const TUNABLES_RON: &str = include_str!("../../../assets/config/tunables.ron");
const LEVELS_RON: &str = include_str!("../../../assets/config/levels.ron");

pub fn plugin(app: &mut App) {
    app.insert_resource(load_tunables(TUNABLES_RON))
        .insert_resource(load_levels(LEVELS_RON))
        .init_resource::<CurrentLevel>()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));

    app.add_systems(OnEnter(GameState::InGame), load_level.before(pool::stock_quivers))
        .add_systems(OnEnter(GameState::LevelComplete), advance_level)
        .add_systems(OnEnter(GameState::Respawning), restart_level)
        .add_systems(Update, next_level_cheat.run_if(in_state(GameState::InGame)));
}

fn load_tunables(src: &str) -> Tunables {
    Tunables::from_ron_str(src).unwrap_or_else(|e| {
        warn!("Bundled tunables rejected, using defaults: {e}");
        Tunables::default()
    })
}

fn load_levels(src: &str) -> LevelConfig {
    LevelConfig::from_ron_str(src).unwrap_or_else(|e| {
        warn!("Bundled level list rejected: {e}");
        LevelConfig::default()
    })
}

/// Publish the current level's data for quiver stocking.
fn load_level(mut commands: Commands, config: Res<LevelConfig>, current: Res<CurrentLevel>) {
    match config.level(&current.0) {
        Ok(data) => {
            info!("Loaded level {}", current.0);
            commands.insert_resource(data.clone());
        }
        Err(e) => {
            warn!("{e}; starting with empty quivers");
            commands.insert_resource(LevelData::default());
        }
    }
}

fn advance_level(
    level: Option<Res<LevelData>>,
    mut current: ResMut<CurrentLevel>,
    mut next: ResMut<NextState<GameState>>,
) {
    let next_level = level.map(|l| l.next_level.clone()).unwrap_or_default();
    if next_level.is_empty() {
        info!("Final level {} complete", current.0);
        return;
    }
    info!("Level {} complete, next up: {next_level}", current.0);
    current.0 = next_level;
    next.set(GameState::InGame);
}

fn restart_level(current: Res<CurrentLevel>, mut next: ResMut<NextState<GameState>>) {
    info!("Restarting level {}", current.0);
    next.set(GameState::InGame);
}

/// `N` skips straight to the next level when there is one.
fn next_level_cheat(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    level: Option<Res<LevelData>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if !keys.is_some_and(|k| k.just_pressed(KeyCode::KeyN)) {
        return;
    }
    if level.is_some_and(|l| !l.next_level.is_empty()) {
        info!("Skipping to the next level");
        next.set(GameState::LevelComplete);
    }
}
