use std::f32::consts::FRAC_PI_4;

use avian2d::prelude::*;
use bevy::math::DVec2;
use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;
use crate::plugins::projectiles::trajectory::{OpenSky, RayHit};

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

/// Every ray is blocked right at its origin.
struct Blocked(Entity);

impl OcclusionQuery for Blocked {
    fn cast_ray(&self, origin: DVec2, _: DVec2, _: f64) -> Option<RayHit> {
        Some(RayHit { point: origin, collider: self.0 })
    }
}

fn test_world() -> World {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    world.init_resource::<ChainLinks>();
    run_system_once(&mut world, stock_chain_links);
    world
}

fn spawn_arrow(world: &mut World, at: Vec2, state: ArrowState) -> Entity {
    world.spawn((state, Transform::from_translation(at.extend(3.0)))).id()
}

fn anchor_with<Q>(world: &mut World, arrow: Entity, occlusion: Q) -> Option<Entity>
where
    Q: OcclusionQuery + Send + Sync + 'static,
{
    run_system_once(
        world,
        move |mut commands: Commands,
              tunables: Res<Tunables>,
              mut links: ResMut<ChainLinks>,
              q: Query<(&ArrowState, &Transform)>| {
            anchor_chain_arrow(&mut commands, &tunables, &mut links, &occlusion, &q, arrow)
        },
    )
}

fn anchor(world: &mut World, arrow: Entity) -> Option<Entity> {
    anchor_with(world, arrow, OpenSky)
}

// --------------------------------------------------------------------------------------
// Layout
// --------------------------------------------------------------------------------------

#[test]
fn layout_splits_distance_into_even_links() {
    let layout = ChainLayout::between(Vec2::ZERO, Vec2::new(3.0, 0.0), 0.5);

    assert_eq!(layout.count(), 6);
    assert_eq!(layout.points.len(), 7);
    assert!((layout.link_length - 0.5).abs() < 1e-6);
    assert_eq!(layout.angle, 0.0);
    assert_eq!(layout.points[0], Vec2::ZERO);
    assert!((layout.points[6] - Vec2::new(3.0, 0.0)).length() < 1e-6);
    assert!((layout.points[3] - Vec2::new(1.5, 0.0)).length() < 1e-6);
}

#[test]
fn layout_rounds_link_count_up_and_shortens_links() {
    let layout = ChainLayout::between(Vec2::ZERO, Vec2::new(1.2, 0.0), 0.5);

    assert_eq!(layout.count(), 3);
    assert!((layout.link_length - 0.4).abs() < 1e-6);
}

#[test]
fn layout_uses_at_least_two_links() {
    let layout = ChainLayout::between(Vec2::ZERO, Vec2::new(0.1, 0.0), 0.5);
    assert_eq!(layout.count(), 2);
    assert!((layout.link_length - 0.05).abs() < 1e-6);

    let degenerate = ChainLayout::between(Vec2::ONE, Vec2::ONE, 0.5);
    assert_eq!(degenerate.count(), 2);
    assert_eq!(degenerate.link_length, 0.0);
    assert!(degenerate.points.iter().all(|&p| p == Vec2::ONE));
}

#[test]
fn layout_angle_follows_segment() {
    let layout = ChainLayout::between(Vec2::ZERO, Vec2::new(2.0, 2.0), 0.5);
    assert!((layout.angle - FRAC_PI_4).abs() < 1e-6);
    assert!((layout.direction() - Vec2::new(1.0, 1.0).normalize()).length() < 1e-6);
}

// --------------------------------------------------------------------------------------
// Partner search
// --------------------------------------------------------------------------------------

#[test]
fn partner_search_skips_invalid_candidates() {
    let mut world = World::new();
    let gone = world.spawn_empty().id();
    let first = world.spawn_empty().id();
    let second = world.spawn_empty().id();

    let pending = [gone, first, second];
    let position_of = |e: Entity| (e != gone).then_some(Vec2::new(5.0, 0.0));

    assert_eq!(find_link_partner(&pending, Vec2::ZERO, position_of, &OpenSky), Some(first));
    assert_eq!(find_link_partner(&pending, Vec2::ZERO, position_of, &Blocked(gone)), None);
    assert_eq!(find_link_partner(&[], Vec2::ZERO, position_of, &OpenSky), None);
}

// --------------------------------------------------------------------------------------
// Anchoring
// --------------------------------------------------------------------------------------

#[test]
fn first_chain_arrow_waits_for_a_partner() {
    let mut world = test_world();
    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);

    assert_eq!(anchor(&mut world, a), None);
    assert_eq!(world.resource::<ChainLinks>().pending, vec![a]);

    // A repeated request does not queue twice.
    assert_eq!(anchor(&mut world, a), None);
    assert_eq!(world.resource::<ChainLinks>().pending, vec![a]);
}

#[test]
fn second_chain_arrow_builds_a_jointed_chain() {
    let mut world = test_world();
    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);
    let b = spawn_arrow(&mut world, Vec2::new(30.0, 0.0), ArrowState::Embedded);

    anchor(&mut world, a);
    assert_eq!(anchor(&mut world, b), Some(a));

    // 30 units at 10 units per link: 3 segments, 4 links, 3 link joints + 2 end joints.
    let chain = world.get::<Chain>(b).unwrap().clone();
    assert_eq!(chain.partner, a);
    assert_eq!(chain.links.len(), 4);
    assert_eq!(chain.joints.len(), 5);
    assert!(world.resource::<ChainLinks>().pending.is_empty());

    for &link in &chain.links {
        assert!(world.get::<RigidBodyDisabled>(link).is_none());
        assert_eq!(*world.get::<Visibility>(link).unwrap(), Visibility::Visible);
    }
    for &joint in &chain.joints {
        assert!(world.get::<RevoluteJoint>(joint).is_some());
    }

    let pool = &world.resource::<ChainLinks>().pool;
    assert_eq!(pool.checked_out(), 4);
    assert_eq!(pool.free_len(), Tunables::default().chain.initial_pool_size - 4);
}

#[test]
fn blocked_line_of_sight_leaves_both_pending() {
    let mut world = test_world();
    let wall = world.spawn_empty().id();
    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);
    let b = spawn_arrow(&mut world, Vec2::new(30.0, 0.0), ArrowState::Embedded);

    anchor(&mut world, a);
    assert_eq!(anchor_with(&mut world, b, Blocked(wall)), None);

    assert_eq!(world.resource::<ChainLinks>().pending, vec![a, b]);
    assert!(world.get::<Chain>(b).is_none());
}

#[test]
fn returned_partner_is_not_a_candidate() {
    let mut world = test_world();
    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);
    anchor(&mut world, a);
    *world.get_mut::<ArrowState>(a).unwrap() = ArrowState::Preview;

    let b = spawn_arrow(&mut world, Vec2::new(30.0, 0.0), ArrowState::Embedded);
    assert_eq!(anchor(&mut world, b), None);
    assert!(world.get::<Chain>(b).is_none());
}

#[test]
fn link_pool_grows_on_demand() {
    let mut world = World::new();
    let mut tunables = Tunables::default();
    tunables.chain.initial_pool_size = 0;
    world.insert_resource(tunables);
    world.init_resource::<ChainLinks>();

    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);
    let b = spawn_arrow(&mut world, Vec2::new(0.0, 50.0), ArrowState::Embedded);
    anchor(&mut world, a);
    anchor(&mut world, b);

    let links = world.get::<Chain>(b).unwrap().links.len();
    assert_eq!(links, 6);
    assert_eq!(world.resource::<ChainLinks>().pool.checked_out(), links);
}

#[test]
fn chain_is_released_when_an_arrow_leaves_embedded() {
    let mut world = test_world();
    let a = spawn_arrow(&mut world, Vec2::ZERO, ArrowState::Embedded);
    let b = spawn_arrow(&mut world, Vec2::new(30.0, 0.0), ArrowState::Embedded);
    anchor(&mut world, a);
    anchor(&mut world, b);
    let chain = world.get::<Chain>(b).unwrap().clone();

    // Still embedded: nothing happens.
    run_system_once(&mut world, release_broken_chains);
    assert!(world.get::<Chain>(b).is_some());

    *world.get_mut::<ArrowState>(a).unwrap() = ArrowState::Preview;
    run_system_once(&mut world, release_broken_chains);

    assert!(world.get::<Chain>(b).is_none());
    for &joint in &chain.joints {
        assert!(world.get_entity(joint).is_err());
    }
    for &link in &chain.links {
        assert!(world.get::<RigidBodyDisabled>(link).is_some());
        assert_eq!(*world.get::<Visibility>(link).unwrap(), Visibility::Hidden);
        assert_eq!(world.get::<LinearVelocity>(link).unwrap().0, Vec2::ZERO);
    }
    let pool = &world.resource::<ChainLinks>().pool;
    assert_eq!(pool.checked_out(), 0);
    assert_eq!(pool.free_len(), Tunables::default().chain.initial_pool_size);
}
