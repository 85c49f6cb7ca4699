//! Arrow lifecycle: one state machine, four impact policies.
//!
//! ```text
//!   Preview ──fire──► Flying ──sticky / embedded arrow──► Embedded
//!                       │
//!                       ├──other (Plain/Bounce/Chain)───► Destroyed
//!                       │
//!                       └──other (Rebound)──► Bounced ──any──► Destroyed | Embedded
//!
//!   any ──return to quiver──► Preview
//! ```
//!
//! Everything here is pure data; `collision::resolve_arrow_contacts` applies the
//! returned [`ImpactOutcome`] to physics components.

use bevy::prelude::*;

use super::components::{ArrowKind, ArrowState};

/// Per-arrow flight data.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Arrow {
    pub kind: ArrowKind,
    /// Unit launch direction, zero while in preview.
    pub launch_dir: Vec2,
    /// Virtual-clock seconds at launch.
    pub launched_at: f32,
    /// Velocity sampled before the latest solver step.
    pub last_velocity: Vec2,
    /// The body that fired this arrow.
    pub firer: Option<Entity>,
    /// Chain arrows link at most once.
    pub chain_attempted: bool,
}

impl Arrow {
    pub fn new(kind: ArrowKind) -> Self {
        Self {
            kind,
            launch_dir: Vec2::ZERO,
            launched_at: 0.0,
            last_velocity: Vec2::ZERO,
            firer: None,
            chain_attempted: false,
        }
    }

    /// Back to the pooled baseline.
    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
    }

    /// Preview → Flying. Returns false (and changes nothing) from any other state.
    pub fn fire(&mut self, state: &mut ArrowState, direction: Vec2, now: f32, firer: Option<Entity>) -> bool {
        if *state != ArrowState::Preview {
            return false;
        }
        self.launch_dir = direction.normalize_or_zero();
        self.launched_at = now;
        self.firer = firer;
        self.chain_attempted = false;
        *state = ArrowState::Flying;
        true
    }

    /// Decide what a contact does to this arrow and advance `state`.
    pub fn on_contact(&mut self, state: &mut ArrowState, contact: &Contact, policy: &ImpactPolicy) -> ImpactOutcome {
        if !state.is_in_flight() {
            return ImpactOutcome::Ignored;
        }
        if self.in_grace(contact, policy) {
            return ImpactOutcome::Ignored;
        }

        if contact.class.embeds() {
            *state = ArrowState::Embedded;
            return ImpactOutcome::Embedded {
                springboard: self.kind == ArrowKind::Bounce,
                link_chain: self.kind == ArrowKind::Chain && !self.chain_attempted,
            };
        }

        match (self.kind, *state) {
            (ArrowKind::Rebound, ArrowState::Flying) => {
                *state = ArrowState::Bounced;
                ImpactOutcome::Rebounded {
                    velocity: policy.rebound(contact),
                    damage: policy.damage,
                }
            }
            (ArrowKind::Rebound, _) => {
                *state = ArrowState::Destroyed;
                ImpactOutcome::Hit { damage: policy.damage, stop: true }
            }
            _ => {
                *state = ArrowState::Destroyed;
                ImpactOutcome::Hit { damage: policy.damage, stop: false }
            }
        }
    }

    /// Early contacts whose normal faces back along the launch direction are
    /// the firer or the surface the arrow left from.
    fn in_grace(&self, contact: &Contact, policy: &ImpactPolicy) -> bool {
        contact.at - self.launched_at < policy.grace_period && self.launch_dir.dot(contact.normal) <= 0.0
    }
}

/// How the other side of a contact is classified. The two predicates are
/// independent; either one embeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactClass {
    pub sticky_surface: bool,
    pub embedded_arrow: bool,
}

impl ContactClass {
    #[inline]
    pub fn embeds(self) -> bool {
        self.sticky_surface || self.embedded_arrow
    }
}

/// A contact from the arrow's point of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the arrow toward the other body.
    pub normal: Vec2,
    /// Other body's velocity minus the arrow's.
    pub relative_velocity: Vec2,
    pub class: ContactClass,
    /// Virtual-clock seconds; the same clock as `Arrow::launched_at`.
    pub at: f32,
}

/// Tunable impact behaviour shared by all arrows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactPolicy {
    pub grace_period: f32,
    pub damage: u32,
    pub restitution: f32,
    pub min_rebound_speed: f32,
}

impl ImpactPolicy {
    /// `reflect(-relative_velocity, normal) * restitution`, raised to the
    /// minimum rebound speed.
    pub fn rebound(&self, contact: &Contact) -> Vec2 {
        let incoming = -contact.relative_velocity;
        let n = contact.normal.normalize_or_zero();
        let reflected = (incoming - 2.0 * incoming.dot(n) * n) * self.restitution;

        let speed = reflected.length();
        if speed >= self.min_rebound_speed {
            reflected
        } else if speed > f32::EPSILON {
            reflected * (self.min_rebound_speed / speed)
        } else {
            -n * self.min_rebound_speed
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImpactOutcome {
    Ignored,
    /// Freeze in place.
    Embedded { springboard: bool, link_chain: bool },
    /// Trajectory complete; damage the target if it can take it.
    Hit { damage: u32, stop: bool },
    /// Keep flying with `velocity`.
    Rebounded { velocity: Vec2, damage: u32 },
}

#[cfg(test)]
mod tests;
