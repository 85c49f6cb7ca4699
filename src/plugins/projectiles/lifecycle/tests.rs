use bevy::prelude::*;

use super::*;

fn policy() -> ImpactPolicy {
    ImpactPolicy { grace_period: 0.15, damage: 100, restitution: 0.5, min_rebound_speed: 2.0 }
}

fn wall_ahead(at: f32) -> Contact {
    Contact {
        normal: Vec2::X,
        relative_velocity: Vec2::new(-10.0, 0.0),
        class: ContactClass::default(),
        at,
    }
}

fn fired(kind: ArrowKind) -> (Arrow, ArrowState) {
    let mut arrow = Arrow::new(kind);
    let mut state = ArrowState::Preview;
    assert!(arrow.fire(&mut state, Vec2::new(3.0, 0.0), 1.0, None));
    (arrow, state)
}

#[test]
fn fire_only_from_preview() {
    let (mut arrow, mut state) = fired(ArrowKind::Plain);
    assert_eq!(state, ArrowState::Flying);
    assert_eq!(arrow.launch_dir, Vec2::X);
    assert!(!arrow.fire(&mut state, Vec2::Y, 2.0, None));
    assert_eq!(arrow.launch_dir, Vec2::X);
}

#[test]
fn preview_arrows_ignore_contacts() {
    let mut arrow = Arrow::new(ArrowKind::Plain);
    let mut state = ArrowState::Preview;
    assert_eq!(arrow.on_contact(&mut state, &wall_ahead(5.0), &policy()), ImpactOutcome::Ignored);
    assert_eq!(state, ArrowState::Preview);
}

#[test]
fn grace_period_suppresses_backward_contacts_only_while_active() {
    let behind = Contact { normal: Vec2::NEG_X, ..wall_ahead(1.05) };

    let (mut arrow, mut state) = fired(ArrowKind::Plain);
    assert_eq!(arrow.on_contact(&mut state, &behind, &policy()), ImpactOutcome::Ignored);
    assert_eq!(state, ArrowState::Flying);

    // Perpendicular normals count as opposing (dot == 0).
    let beside = Contact { normal: Vec2::Y, ..behind };
    assert_eq!(arrow.on_contact(&mut state, &beside, &policy()), ImpactOutcome::Ignored);

    let later = Contact { at: 1.2, ..behind };
    assert_eq!(
        arrow.on_contact(&mut state, &later, &policy()),
        ImpactOutcome::Hit { damage: 100, stop: false }
    );
    assert_eq!(state, ArrowState::Destroyed);
}

#[test]
fn forward_contacts_land_inside_grace_period() {
    let (mut arrow, mut state) = fired(ArrowKind::Plain);
    let outcome = arrow.on_contact(&mut state, &wall_ahead(1.01), &policy());
    assert_eq!(outcome, ImpactOutcome::Hit { damage: 100, stop: false });
}

#[test]
fn sticky_surface_and_embedded_arrow_both_embed() {
    for class in [
        ContactClass { sticky_surface: true, embedded_arrow: false },
        ContactClass { sticky_surface: false, embedded_arrow: true },
    ] {
        let (mut arrow, mut state) = fired(ArrowKind::Plain);
        let contact = Contact { class, ..wall_ahead(3.0) };
        assert_eq!(
            arrow.on_contact(&mut state, &contact, &policy()),
            ImpactOutcome::Embedded { springboard: false, link_chain: false }
        );
        assert_eq!(state, ArrowState::Embedded);
        // Terminal: later contacts change nothing.
        assert_eq!(arrow.on_contact(&mut state, &wall_ahead(4.0), &policy()), ImpactOutcome::Ignored);
        assert_eq!(state, ArrowState::Embedded);
    }
}

#[test]
fn bounce_and_chain_variants_flag_their_embed_effects() {
    let sticky = Contact { class: ContactClass { sticky_surface: true, embedded_arrow: false }, ..wall_ahead(3.0) };

    let (mut bounce, mut state) = fired(ArrowKind::Bounce);
    assert_eq!(
        bounce.on_contact(&mut state, &sticky, &policy()),
        ImpactOutcome::Embedded { springboard: true, link_chain: false }
    );

    let (mut chain, mut state) = fired(ArrowKind::Chain);
    assert_eq!(
        chain.on_contact(&mut state, &sticky, &policy()),
        ImpactOutcome::Embedded { springboard: false, link_chain: true }
    );
}

#[test]
fn rebound_reflects_once_then_completes() {
    let (mut arrow, mut state) = fired(ArrowKind::Rebound);

    let first = arrow.on_contact(&mut state, &wall_ahead(3.0), &policy());
    let ImpactOutcome::Rebounded { velocity, damage } = first else {
        panic!("expected a rebound, got {first:?}");
    };
    assert_eq!(damage, 100);
    assert!((velocity - Vec2::new(-5.0, 0.0)).length() < 1e-5);
    assert_eq!(state, ArrowState::Bounced);

    let second = arrow.on_contact(&mut state, &wall_ahead(3.5), &policy());
    assert_eq!(second, ImpactOutcome::Hit { damage: 100, stop: true });
    assert_eq!(state, ArrowState::Destroyed);
}

#[test]
fn rebound_embeds_after_bouncing_on_sticky_surface() {
    let (mut arrow, mut state) = fired(ArrowKind::Rebound);
    arrow.on_contact(&mut state, &wall_ahead(3.0), &policy());

    let sticky = Contact { class: ContactClass { sticky_surface: true, embedded_arrow: false }, ..wall_ahead(3.2) };
    assert!(matches!(arrow.on_contact(&mut state, &sticky, &policy()), ImpactOutcome::Embedded { .. }));
    assert_eq!(state, ArrowState::Embedded);
}

#[test]
fn rebound_speed_is_clamped_to_minimum() {
    let slow = Contact { relative_velocity: Vec2::new(-1.0, 0.0), ..wall_ahead(3.0) };
    let v = policy().rebound(&slow);
    assert!((v.length() - 2.0).abs() < 1e-5);
    assert!(v.x < 0.0);

    let still = Contact { relative_velocity: Vec2::ZERO, ..wall_ahead(3.0) };
    assert_eq!(policy().rebound(&still), Vec2::new(-2.0, 0.0));
}

#[test]
fn rebound_off_floor_keeps_horizontal_motion() {
    let floor = Contact {
        normal: Vec2::NEG_Y,
        relative_velocity: Vec2::new(-6.0, 8.0),
        class: ContactClass::default(),
        at: 0.0,
    };
    let p = ImpactPolicy { restitution: 1.0, ..policy() };
    let v = p.rebound(&floor);
    assert!((v - Vec2::new(6.0, 8.0)).length() < 1e-5);
}

#[test]
fn reset_restores_fresh_baseline() {
    let mut world = World::new();
    let archer = world.spawn_empty().id();

    let mut arrow = Arrow::new(ArrowKind::Chain);
    let mut state = ArrowState::Preview;
    arrow.fire(&mut state, Vec2::Y, 7.0, Some(archer));
    arrow.last_velocity = Vec2::new(4.0, 2.0);
    arrow.chain_attempted = true;

    arrow.reset();
    assert_eq!(arrow, Arrow::new(ArrowKind::Chain));
}
