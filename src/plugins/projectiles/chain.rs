//! Chain arrows: strung together with a rope of jointed links.
//!
//! ```text
//!   ChainAnchorRequest(arrow)
//!        │
//!        ├─ pending anchor in sight? ──yes──► build chain, partner leaves pending
//!        │                                        │
//!        └─ no ──► arrow joins pending            ▼
//!                                          A ─o─[link]─o─[link]─o─ ... ─o─ B
//!                                             ▲ revolute joints, ±max_joint_angle
//! ```
//!
//! Links are pooled. A pooled link keeps its body but is disabled
//! (`RigidBodyDisabled` + `ColliderDisabled`) and hidden. A chain is torn down
//! as soon as either of its arrows leaves `Embedded`.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::{chain_validity_mask, Layer};
use crate::common::tunables::Tunables;

use super::collision::ChainAnchorRequest;
use super::components::ArrowState;
use super::pool::EntityPool;
use super::trajectory::{OcclusionQuery, PhysicsOcclusion};

/// Marker for chain link bodies.
#[derive(Component, Debug, Clone, Copy)]
pub struct ChainLink;

/// Link pool plus the embedded chain arrows still waiting for a partner.
#[derive(Resource, Debug, Default)]
pub struct ChainLinks {
    pub pool: EntityPool,
    /// Oldest first.
    pub pending: Vec<Entity>,
}

/// A built chain, stored on the arrow that completed it.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Chain {
    pub partner: Entity,
    pub links: Vec<Entity>,
    pub joints: Vec<Entity>,
}

/// Where the links of a chain go.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLayout {
    /// Link centres, `count + 1` of them, start to end.
    pub points: Vec<Vec2>,
    /// Segment length actually used: `distance / count`.
    pub link_length: f32,
    /// Segment angle, radians.
    pub angle: f32,
}

impl ChainLayout {
    pub fn between(start: Vec2, end: Vec2, link_length: f32) -> Self {
        let delta = end - start;
        let distance = delta.length();
        let count = ((distance / link_length).ceil() as usize).max(2);
        let points = (0..=count)
            .map(|i| start.lerp(end, i as f32 / count as f32))
            .collect();

        Self {
            points,
            link_length: distance / count as f32,
            angle: delta.y.atan2(delta.x),
        }
    }

    /// Number of segments (one less than the number of links).
    #[inline]
    pub fn count(&self) -> usize {
        self.points.len() - 1
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }
}

/// First pending anchor that still exists, is still embedded and can be seen
/// from `from`. `position_of` returns `None` for anything that is no longer a
/// valid partner.
pub fn find_link_partner<Q, F>(pending: &[Entity], from: Vec2, position_of: F, occlusion: &Q) -> Option<Entity>
where
    Q: OcclusionQuery + ?Sized,
    F: Fn(Entity) -> Option<Vec2>,
{
    pending.iter().copied().find(|&candidate| {
        position_of(candidate)
            .is_some_and(|to| occlusion.line_of_sight(from.as_dvec2(), to.as_dvec2()))
    })
}

#[inline]
fn active_link_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::ChainLink,
        [Layer::World, Layer::ArrowSurface, Layer::Player, Layer::Arrow, Layer::Prop],
    )
}

/// Spawn one pooled (disabled) link.
pub fn spawn_chain_link(commands: &mut Commands, tunables: &Tunables) -> Entity {
    let length = tunables.meters(tunables.chain.link_length);
    let width = tunables.meters(tunables.chain.link_width);

    commands
        .spawn((
            Name::new("ChainLink"),
            ChainLink,
            Sprite {
                color: Color::srgb(0.55, 0.55, 0.6),
                custom_size: Some(Vec2::new(length, width) * 0.9),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 2.0),
            Visibility::Hidden,
            RigidBody::Dynamic,
            Collider::rectangle(length, width),
            CollisionLayers::new(LayerMask::NONE, LayerMask::NONE),
            Mass(tunables.chain.link_mass),
            LinearDamping(0.5),
            AngularDamping(0.5),
            LinearVelocity(Vec2::ZERO),
            AngularVelocity(0.0),
            (RigidBodyDisabled, ColliderDisabled),
        ))
        .id()
}

/// Restore the pooled baseline on a link.
pub fn stash_chain_link(commands: &mut Commands, e: Entity) {
    commands.entity(e).insert((
        Visibility::Hidden,
        RigidBody::Dynamic,
        CollisionLayers::new(LayerMask::NONE, LayerMask::NONE),
        LinearVelocity(Vec2::ZERO),
        AngularVelocity(0.0),
        RigidBodyDisabled,
        ColliderDisabled,
    ));
}

/// Fill the link pool up to the configured size.
pub fn stock_chain_links(mut commands: Commands, tunables: Res<Tunables>, mut links: ResMut<ChainLinks>) {
    links.pending.clear();
    let missing = tunables.chain.initial_pool_size.saturating_sub(links.pool.free_len());
    for _ in 0..missing {
        let e = spawn_chain_link(&mut commands, &tunables);
        links.pool.stock(e);
    }
}

fn acquire_link(commands: &mut Commands, tunables: &Tunables, links: &mut ChainLinks) -> Entity {
    if let Some(e) = links.pool.acquire() {
        return e;
    }
    debug!("Chain link pool empty, growing");
    let e = spawn_chain_link(commands, tunables);
    links.pool.stock(e);
    links.pool.acquire().unwrap_or(e)
}

/// World point `p` in the local frame of `tf`.
#[inline]
fn to_local(tf: &Transform, p: Vec2) -> Vec2 {
    let local = tf.rotation.inverse() * (p.extend(tf.translation.z) - tf.translation);
    local.truncate()
}

/// Lay out links between two embedded arrows and joint them together.
pub fn build_chain(
    commands: &mut Commands,
    tunables: &Tunables,
    links: &mut ChainLinks,
    (start_arrow, start_tf): (Entity, &Transform),
    (end_arrow, end_tf): (Entity, &Transform),
) -> Chain {
    let layout = ChainLayout::between(
        start_tf.translation.truncate(),
        end_tf.translation.truncate(),
        tunables.meters(tunables.chain.link_length),
    );
    let width = tunables.meters(tunables.chain.link_width);
    let limit = tunables.chain.max_joint_angle.to_radians();
    let half = Vec2::X * layout.link_length * 0.5;

    let mut chain = Chain {
        partner: end_arrow,
        links: Vec::with_capacity(layout.points.len()),
        joints: Vec::with_capacity(layout.points.len() + 1),
    };

    for &point in &layout.points {
        let link = acquire_link(commands, tunables, links);
        commands
            .entity(link)
            .insert((
                Transform::from_translation(point.extend(2.0)).with_rotation(Quat::from_rotation_z(layout.angle)),
                Position(point),
                Rotation::radians(layout.angle),
                Collider::rectangle(layout.link_length.max(f32::EPSILON), width),
                Sprite {
                    color: Color::srgb(0.55, 0.55, 0.6),
                    custom_size: Some(Vec2::new(layout.link_length, width) * 0.9),
                    ..default()
                },
                active_link_layers(),
                LinearVelocity(Vec2::ZERO),
                AngularVelocity(0.0),
                Visibility::Visible,
            ))
            .remove::<(RigidBodyDisabled, ColliderDisabled)>();

        if let Some(&prev) = chain.links.last() {
            let joint = RevoluteJoint::new(prev, link)
                .with_local_anchor1(half)
                .with_local_anchor2(-half)
                .with_angle_limits(-limit, limit);
            chain.joints.push(commands.spawn(joint).id());
        }
        chain.links.push(link);
    }

    // Pin both ends onto their arrows.
    let dir = layout.direction();
    let ends = [
        (chain.links[0], -half, start_arrow, start_tf, layout.points[0] - dir * layout.link_length * 0.5),
        (chain.links[layout.count()], half, end_arrow, end_tf, layout.points[layout.count()] + dir * layout.link_length * 0.5),
    ];
    for (link, link_anchor, arrow, arrow_tf, world_anchor) in ends {
        let joint = RevoluteJoint::new(link, arrow)
            .with_local_anchor1(link_anchor)
            .with_local_anchor2(to_local(arrow_tf, world_anchor))
            .with_angle_limits(-limit, limit);
        chain.joints.push(commands.spawn(joint).id());
    }

    info!(
        "Chain linked {:?} -> {:?} with {} links",
        start_arrow,
        end_arrow,
        chain.links.len()
    );
    chain
}

/// Despawn a chain's joints and return its links to the pool.
pub fn clear_chain(commands: &mut Commands, links: &mut ChainLinks, chain: &Chain) {
    for &joint in &chain.joints {
        commands.entity(joint).despawn();
    }
    for &link in &chain.links {
        match links.pool.release(link) {
            Ok(()) => stash_chain_link(commands, link),
            Err(e) => warn!("Chain link return rejected: {e}"),
        }
    }
}

/// Link `arrow` to a pending partner, or make it pending itself.
/// Returns the partner when a chain was built.
pub fn anchor_chain_arrow<Q: OcclusionQuery + ?Sized>(
    commands: &mut Commands,
    tunables: &Tunables,
    links: &mut ChainLinks,
    occlusion: &Q,
    q_arrows: &Query<(&ArrowState, &Transform)>,
    arrow: Entity,
) -> Option<Entity> {
    let Ok((state, tf)) = q_arrows.get(arrow) else {
        return None;
    };
    if *state != ArrowState::Embedded || links.pending.contains(&arrow) {
        return None;
    }

    let position_of = |e: Entity| match q_arrows.get(e) {
        Ok((ArrowState::Embedded, other_tf)) if e != arrow => Some(other_tf.translation.truncate()),
        Ok(_) => None,
        Err(_) => {
            warn!("Pending chain anchor {e:?} vanished");
            None
        }
    };

    let Some(partner) = find_link_partner(&links.pending, tf.translation.truncate(), position_of, occlusion) else {
        links.pending.push(arrow);
        debug!("Chain arrow {arrow:?} waiting for a partner");
        return None;
    };

    links.pending.retain(|&e| e != partner);
    let Ok((_, partner_tf)) = q_arrows.get(partner) else {
        return None;
    };
    let chain = build_chain(commands, tunables, links, (arrow, tf), (partner, partner_tf));
    commands.entity(arrow).insert(chain);
    Some(partner)
}

/// Consume anchor requests from freshly embedded chain arrows.
pub fn link_chain_arrows(
    mut commands: Commands,
    tunables: Res<Tunables>,
    spatial: SpatialQuery,
    mut requests: MessageReader<ChainAnchorRequest>,
    mut links: ResMut<ChainLinks>,
    q_arrows: Query<(&ArrowState, &Transform)>,
) {
    let occlusion = PhysicsOcclusion {
        spatial: &spatial,
        filter: SpatialQueryFilter::from_mask(chain_validity_mask()),
    };
    for req in requests.read() {
        anchor_chain_arrow(&mut commands, &tunables, &mut links, &occlusion, &q_arrows, req.arrow);
    }
}

/// Tear down chains whose arrows are no longer embedded, and forget pending
/// anchors that were returned or despawned.
pub fn release_broken_chains(
    mut commands: Commands,
    mut links: ResMut<ChainLinks>,
    q_chains: Query<(Entity, &Chain)>,
    q_states: Query<&ArrowState>,
) {
    let embedded = |e: Entity| q_states.get(e).is_ok_and(|s| *s == ArrowState::Embedded);

    for (arrow, chain) in &q_chains {
        if embedded(arrow) && embedded(chain.partner) {
            continue;
        }
        clear_chain(&mut commands, &mut links, chain);
        commands.entity(arrow).remove::<Chain>();
        info!("Chain on {arrow:?} released");
    }

    links.pending.retain(|&e| embedded(e));
}

#[cfg(test)]
mod tests;
