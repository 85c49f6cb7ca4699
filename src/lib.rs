//! Archery puzzle game: trajectory preview, arrow lifecycle, bow and tutorial.
//!
//! The binary only calls `game::run`; integration tests build a headless app
//! through `game::configure_headless`.

pub mod common;
pub mod game;
pub mod plugins;
