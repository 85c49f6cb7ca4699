//! Global state machine.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    /// Goal reached; gameplay systems stop, `LevelData::next_level` is up next.
    LevelComplete,
    /// The archer died; the current level is rebuilt on the next frame.
    Respawning,
}
