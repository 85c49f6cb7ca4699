use std::time::Duration;

use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;
use crate::plugins::projectiles::components::ArrowKind;

fn test_world(level: &str) -> World {
    let mut world = World::new();
    world.insert_resource(CurrentLevel(level.to_owned()));
    world.init_resource::<Time>();
    world.init_resource::<TutorialText>();
    world.init_resource::<Messages<TutorialCue>>();
    world.init_resource::<Messages<PlayerMoved>>();
    world.init_resource::<Messages<PlayerJumped>>();
    world.init_resource::<Messages<BowEvent>>();
    world.init_resource::<Messages<GoalStateChanged>>();
    world
}

/// One Update pass of the tutorial chain after `secs` of frame time.
fn frame(world: &mut World, secs: f32) {
    world.resource_mut::<Time>().advance_by(Duration::from_secs_f32(secs));
    run_system_once(world, forward_tutorial_events);
    run_system_once(world, skip_tutorial_step);
    run_system_once(world, tick_tutorial);
    run_system_once(world, show_tutorial_text);

    world.resource_mut::<Messages<PlayerMoved>>().clear();
    world.resource_mut::<Messages<PlayerJumped>>().clear();
    world.resource_mut::<Messages<BowEvent>>().clear();
    world.resource_mut::<Messages<GoalStateChanged>>().clear();
    world.resource_mut::<Messages<TutorialCue>>().clear();
}

fn text(world: &World) -> Option<String> {
    world.resource::<TutorialText>().0.clone()
}

fn current(world: &World) -> Option<usize> {
    world.resource::<TutorialSequencer>().current_index()
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[test]
fn default_tutorial_walks_every_mechanic() {
    let steps = default_tutorial(FADE_SECONDS);
    let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        ["move", "jump", "charge", "aim", "fire", "sticky", "select", "bounce", "rebound", "chain", "goal"]
    );
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn tutorial_runs_only_on_the_tutorial_level() {
    let mut world = test_world("tutorial");
    run_system_once(&mut world, start_tutorial);
    assert_eq!(world.resource::<TutorialSequencer>().len(), 11);

    let mut world = test_world("courtyard");
    run_system_once(&mut world, start_tutorial);
    assert!(world.get_resource::<TutorialSequencer>().is_none());
}

#[test]
fn leaving_the_level_stops_the_tutorial() {
    let mut world = test_world("tutorial");
    run_system_once(&mut world, start_tutorial);
    frame(&mut world, 0.0);
    assert!(text(&world).is_some());

    run_system_once(&mut world, stop_tutorial);
    assert!(world.get_resource::<TutorialSequencer>().is_none());
    assert_eq!(text(&world), None);
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

#[test]
fn moving_advances_to_the_jump_step() {
    let mut world = test_world("tutorial");
    run_system_once(&mut world, start_tutorial);

    frame(&mut world, 0.0);
    assert_eq!(text(&world).as_deref(), Some("Use WASD to move"));
    frame(&mut world, FADE_SECONDS);
    assert!(world.resource::<TutorialSequencer>().is_waiting());

    world.write_message(PlayerMoved);
    frame(&mut world, 1.0);
    assert_eq!(current(&world), Some(0), "held by the minimum dwell");

    frame(&mut world, 1.0);
    assert_eq!(text(&world), None, "fading out");

    frame(&mut world, FADE_SECONDS);
    assert_eq!(current(&world), Some(1));
    assert_eq!(text(&world).as_deref(), Some("Use the space bar to jump"));
}

#[test]
fn bow_events_map_onto_tutorial_events() {
    assert_eq!(
        from_bow_event(&BowEvent::ChargeStarted(ArrowKind::Plain)),
        Some(TutorialEvent::ChargeStarted)
    );
    assert_eq!(from_bow_event(&BowEvent::Fired(ArrowKind::Chain)), Some(TutorialEvent::Fired));
    assert_eq!(
        from_bow_event(&BowEvent::SelectionChanged(ArrowKind::Bounce)),
        Some(TutorialEvent::SelectionChanged)
    );
    assert_eq!(from_bow_event(&BowEvent::ChargeCancelled(ArrowKind::Plain)), None);
}

#[test]
fn the_wrong_action_does_not_advance() {
    let mut world = test_world("tutorial");
    run_system_once(&mut world, start_tutorial);
    frame(&mut world, 0.0);
    frame(&mut world, FADE_SECONDS);

    world.write_message(PlayerJumped);
    world.write_message(BowEvent::Fired(ArrowKind::Plain));
    world.write_message(GoalStateChanged(true));
    frame(&mut world, 5.0);

    assert_eq!(current(&world), Some(0));
    assert_eq!(text(&world).as_deref(), Some("Use WASD to move"));
}

#[test]
fn tab_skips_the_current_step() {
    let mut world = test_world("tutorial");
    world.init_resource::<ButtonInput<KeyCode>>();
    run_system_once(&mut world, start_tutorial);
    frame(&mut world, 0.0);
    frame(&mut world, FADE_SECONDS);

    world.resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::Tab);
    frame(&mut world, 2.0);
    assert_eq!(text(&world), None);

    world.resource_mut::<ButtonInput<KeyCode>>().clear();
    frame(&mut world, FADE_SECONDS);
    assert_eq!(current(&world), Some(1));
}
