use bevy::prelude::*;
use serde::Deserialize;

/// Which impact policy an arrow runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum ArrowKind {
    Plain,
    /// Becomes a springboard once embedded.
    Bounce,
    /// Reflects off the first non-sticky surface.
    Rebound,
    /// Strings a chain to an earlier embedded chain arrow.
    Chain,
}

impl ArrowKind {
    pub const ALL: [ArrowKind; 4] = [Self::Plain, Self::Bounce, Self::Rebound, Self::Chain];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Plain => "Arrow",
            Self::Bounce => "Bouncy Arrow",
            Self::Rebound => "Rebound Arrow",
            Self::Chain => "Chain Arrow",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Plain => Color::srgb(0.85, 0.8, 0.7),
            Self::Bounce => Color::srgb(0.4, 0.9, 0.45),
            Self::Rebound => Color::srgb(0.35, 0.6, 1.0),
            Self::Chain => Color::srgb(0.75, 0.75, 0.8),
        }
    }
}

/// Arrow lifecycle.
///
/// `Preview` doubles as the pooled baseline: a pooled arrow is a hidden,
/// collision-less `Preview` arrow.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrowState {
    #[default]
    Preview,
    Flying,
    /// Stuck in a sticky surface or another embedded arrow. Terminal.
    Embedded,
    /// Rebound arrow after its one reflection; still in flight.
    Bounced,
    /// Trajectory completed by a non-sticky impact. Terminal.
    Destroyed,
}

impl ArrowState {
    #[inline]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Flying | Self::Bounced)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Embedded | Self::Destroyed)
    }
}

/// Marker for arrows owned by a quiver pool.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledArrow {
    pub kind: ArrowKind,
}

/// Embedded bounce arrow: launches bodies that land on it.
#[derive(Component, Debug, Clone, Copy)]
pub struct Springboard;

/// Damage sink.
#[derive(Component, Debug, Clone)]
pub struct Health {
    pub hp: u32,
    pub max_hp: u32,
    pub invulnerable: bool,
}

impl Health {
    pub fn new(max_hp: u32) -> Self {
        Self { hp: max_hp, max_hp, invulnerable: false }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Saturating; ignored while invulnerable or already dead.
    pub fn damage(&mut self, amount: u32) {
        if self.invulnerable || self.is_dead() {
            return;
        }
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Clamped to `max_hp`; brings the dead back.
    pub fn heal(&mut self, amount: u32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_saturates_and_respects_invulnerability() {
        let mut hp = Health::new(150);
        hp.damage(100);
        assert_eq!(hp.hp, 50);
        hp.damage(100);
        assert_eq!(hp.hp, 0);
        assert!(hp.is_dead());

        let mut shielded = Health { invulnerable: true, ..Health::new(10) };
        shielded.damage(5);
        assert_eq!(shielded.hp, 10);
    }

    #[test]
    fn heal_clamps_and_revives() {
        let mut hp = Health::new(100);
        hp.damage(100);
        hp.heal(250);
        assert_eq!(hp.hp, 100);
        assert!(!hp.is_dead());
    }

    #[test]
    fn terminal_states() {
        assert!(ArrowState::Embedded.is_terminal());
        assert!(ArrowState::Destroyed.is_terminal());
        assert!(!ArrowState::Bounced.is_terminal());
        assert!(ArrowState::Bounced.is_in_flight());
        assert!(!ArrowState::Preview.is_in_flight());
    }
}
