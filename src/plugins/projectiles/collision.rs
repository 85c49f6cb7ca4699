//! Contact pipeline for arrows.
//!
//! ```text
//!  FixedUpdate      track_arrow_flight      (record pre-step velocity, face along it)
//!  FixedPostUpdate  physics → CollisionStart
//!                   gather_arrow_contacts   (CollisionStart + contact normal → ArrowContact)
//!                   resolve_arrow_contacts  (lifecycle decision → body/health writes)
//! ```
//!
//! `ArrowContact` is emitted once per arrow side, so arrow-vs-arrow contacts are
//! seen by both arrows (the embedded one may be a springboard).

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::tunables::Tunables;

use super::components::{ArrowState, Health, Springboard};
use super::lifecycle::{Arrow, Contact, ContactClass, ImpactOutcome, ImpactPolicy};

/// A contact started by an arrow, seen from the arrow.
#[derive(Message, Clone, Copy, Debug)]
pub struct ArrowContact {
    pub arrow: Entity,
    pub other: Entity,
    pub other_body: Option<Entity>,
    /// Unit normal from the arrow toward `other`.
    pub normal: Vec2,
}

impl ArrowContact {
    #[inline]
    fn gameplay_owner(&self) -> Entity {
        self.other_body.unwrap_or(self.other)
    }
}

/// An embedded chain arrow looking for a partner.
#[derive(Message, Clone, Copy, Debug)]
pub struct ChainAnchorRequest {
    pub arrow: Entity,
}

impl ImpactPolicy {
    pub fn from_tunables(t: &Tunables) -> Self {
        Self {
            grace_period: t.arrow.grace_period,
            damage: t.arrow.damage,
            restitution: t.arrow.rebound_restitution,
            min_rebound_speed: t.meters(t.arrow.rebound_min_speed),
        }
    }
}

/// Keep in-flight arrows pointing along their velocity and remember that
/// velocity for rebound maths.
pub fn track_arrow_flight(mut q: Query<(&mut Arrow, &ArrowState, &LinearVelocity, &mut Rotation)>) {
    for (mut arrow, state, vel, mut rot) in &mut q {
        if !state.is_in_flight() {
            continue;
        }
        arrow.last_velocity = vel.0;
        if vel.0.length_squared() > 1e-3 {
            *rot = Rotation::radians(vel.0.y.atan2(vel.0.x));
        }
    }
}

pub fn gather_arrow_contacts(
    mut started: MessageReader<CollisionStart>,
    collisions: Collisions,
    q_arrows: Query<&Arrow>,
    q_sensors: Query<(), With<Sensor>>,
    mut writer: MessageWriter<ArrowContact>,
) {
    for ev in started.read() {
        let sides = [
            (ev.collider1, ev.collider2, ev.body2),
            (ev.collider2, ev.collider1, ev.body1),
        ];
        for (arrow_e, other, other_body) in sides {
            let Ok(arrow) = q_arrows.get(arrow_e) else {
                continue;
            };
            // Wind and other sensors push arrows but are never struck.
            if q_sensors.contains(other) {
                continue;
            }

            // Manifold normals point from the pair's first collider to its second.
            let normal = collisions
                .get(arrow_e, other)
                .and_then(|pair| {
                    let n = pair.manifolds.first()?.normal;
                    Some(if pair.collider1 == arrow_e { n } else { -n })
                })
                .unwrap_or_else(|| arrow.last_velocity.normalize_or_zero());

            writer.write(ArrowContact { arrow: arrow_e, other, other_body, normal });
        }
    }
}

#[inline]
fn is_sticky(layers: &CollisionLayers) -> bool {
    layers.memberships.has_all(Layer::ArrowSurface)
}

pub fn resolve_arrow_contacts(
    mut commands: Commands,
    time: Res<Time<Virtual>>,
    tunables: Res<Tunables>,
    mut contacts: MessageReader<ArrowContact>,
    mut q_arrows: Query<(&mut Arrow, &mut ArrowState, Has<Springboard>)>,
    mut q_bodies: Query<(&mut RigidBody, &mut LinearVelocity, &mut AngularVelocity)>,
    q_layers: Query<&CollisionLayers>,
    mut q_health: Query<&mut Health>,
    mut chain_requests: MessageWriter<ChainAnchorRequest>,
    mut launched: Local<HashSet<Entity>>,
) {
    let policy = ImpactPolicy::from_tunables(&tunables);
    let now = time.elapsed_secs();
    launched.clear();

    for c in contacts.read() {
        let owner = c.gameplay_owner();
        let class = ContactClass {
            sticky_surface: q_layers.get(c.other).is_ok_and(is_sticky),
            embedded_arrow: q_arrows
                .get(owner)
                .is_ok_and(|(_, state, _)| *state == ArrowState::Embedded),
        };

        let Ok((mut arrow, mut state, springboard)) = q_arrows.get_mut(c.arrow) else {
            continue;
        };

        if springboard && *state == ArrowState::Embedded {
            // Springboard: fling whatever dynamic body landed on us, once per tick.
            if launched.insert(owner) {
                if let Ok((body, mut vel, _)) = q_bodies.get_mut(owner) {
                    if *body != RigidBody::Static {
                        vel.0 = Vec2::Y * tunables.meters(tunables.arrow.bounce_speed);
                        debug!("Springboard {:?} launched {:?}", c.arrow, owner);
                    }
                }
            }
            continue;
        }

        let relative_velocity = q_bodies
            .get(owner)
            .map(|(_, v, _)| v.0)
            .unwrap_or(Vec2::ZERO)
            - arrow.last_velocity;
        let contact = Contact { normal: c.normal, relative_velocity, class, at: now };

        match arrow.on_contact(&mut state, &contact, &policy) {
            ImpactOutcome::Ignored => {}
            ImpactOutcome::Embedded { springboard, link_chain } => {
                if let Ok((mut body, mut vel, mut spin)) = q_bodies.get_mut(c.arrow) {
                    vel.0 = Vec2::ZERO;
                    spin.0 = 0.0;
                    *body = RigidBody::Static;
                }
                if springboard {
                    commands.entity(c.arrow).insert(Springboard);
                }
                if link_chain {
                    arrow.chain_attempted = true;
                    chain_requests.write(ChainAnchorRequest { arrow: c.arrow });
                }
            }
            ImpactOutcome::Hit { damage, stop } => {
                if let Ok(mut hp) = q_health.get_mut(owner) {
                    hp.damage(damage);
                }
                if stop {
                    if let Ok((_, mut vel, mut spin)) = q_bodies.get_mut(c.arrow) {
                        vel.0 = Vec2::ZERO;
                        spin.0 = 0.0;
                    }
                }
            }
            ImpactOutcome::Rebounded { velocity, damage } => {
                if let Ok(mut hp) = q_health.get_mut(owner) {
                    hp.damage(damage);
                }
                if let Ok((_, mut vel, mut spin)) = q_bodies.get_mut(c.arrow) {
                    vel.0 = velocity;
                    spin.0 = 0.0;
                }
                arrow.last_velocity = velocity;
            }
        }
    }
}
