//! Level/session data: per-level ammo and level linkage.
//!
//! Read once when quivers are stocked; nothing in the core writes it back.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::common::error::ConfigError;
use crate::plugins::projectiles::components::ArrowKind;

#[derive(Resource, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub arrow_counts: HashMap<ArrowKind, u32>,
    pub next_level: String,
}

impl LevelData {
    /// Starting ammo for `kind`; kinds the level doesn't list get none.
    pub fn arrow_count(&self, kind: ArrowKind) -> u32 {
        self.arrow_counts.get(&kind).copied().unwrap_or(0)
    }
}

/// Name of the level being played.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct CurrentLevel(pub String);

impl CurrentLevel {
    pub const TUTORIAL: &'static str = "tutorial";

    pub fn is_tutorial(&self) -> bool {
        self.0 == Self::TUTORIAL
    }
}

impl Default for CurrentLevel {
    fn default() -> Self {
        Self(Self::TUTORIAL.to_owned())
    }
}

/// All levels, keyed by level name.
#[derive(Resource, Debug, Clone, Default, Deserialize)]
pub struct LevelConfig {
    pub levels: HashMap<String, LevelData>,
}

impl LevelConfig {
    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(src)?)
    }

    pub fn level(&self, name: &str) -> Result<&LevelData, ConfigError> {
        self.levels
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLevel(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: &str = r#"(
        levels: {
            "tutorial": (
                arrow_counts: { Plain: 10, Bounce: 3 },
                next_level: "canyon",
            ),
            "canyon": (arrow_counts: { Chain: 4 }),
        },
    )"#;

    #[test]
    fn parses_levels_and_defaults_missing_kinds_to_zero() {
        let cfg = LevelConfig::from_ron_str(LEVELS).unwrap();
        let tutorial = cfg.level("tutorial").unwrap();
        assert_eq!(tutorial.arrow_count(ArrowKind::Plain), 10);
        assert_eq!(tutorial.arrow_count(ArrowKind::Bounce), 3);
        assert_eq!(tutorial.arrow_count(ArrowKind::Rebound), 0);
        assert_eq!(tutorial.next_level, "canyon");

        let canyon = cfg.level("canyon").unwrap();
        assert_eq!(canyon.arrow_count(ArrowKind::Chain), 4);
        assert!(canyon.next_level.is_empty());
    }

    #[test]
    fn unknown_level_is_an_error() {
        let cfg = LevelConfig::from_ron_str(LEVELS).unwrap();
        assert!(matches!(cfg.level("moon"), Err(ConfigError::UnknownLevel(name)) if name == "moon"));
    }
}
