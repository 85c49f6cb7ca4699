//! World plugin: arena walls, wooden platforms, the ball and its goal, plus
//! hazards and lever-driven mechanisms.
//!
//! Stone (`Layer::World`) never holds an arrow; wood (`Layer::ArrowSurface`)
//! does. The goal, the exit and wind areas are sensors on `Layer::Trigger`.
//!
//! ```text
//!   ball enters/leaves goal ─► GoalStateChanged(bool)  (tutorial's last step)
//!   player enters exit      ─► GameState::LevelComplete
//!   body touches spike      ─► Health::damage
//!   lever flips             ─► door opens, lift rises
//! ```

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::player::Player;

pub mod hazards;
pub mod mechanisms;

pub use hazards::{Spike, WindArea};
pub use mechanisms::{Door, Lever, LeverToggled, MovingPlatform};

const TILE: f32 = 64.0;
const HALF_W: f32 = TILE * 16.0;
const HALF_H: f32 = TILE * 9.0;
const WALL_THICKNESS: f32 = 30.0;
const BALL_RADIUS: f32 = 18.0;

/// The prop the player has to deliver.
#[derive(Component, Debug)]
pub struct Ball;

#[derive(Component, Debug)]
pub struct Goal;

#[derive(Component, Debug)]
pub struct LevelExit;

/// The ball entered (`true`) or left (`false`) the goal.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalStateChanged(pub bool);

pub fn plugin(app: &mut App) {
    app.add_message::<GoalStateChanged>()
        .add_message::<LeverToggled>()
        .add_systems(
            OnEnter(GameState::InGame),
            (
                spawn_arena,
                spawn_platforms,
                spawn_ball_and_goal,
                hazards::spawn_hazards,
                mechanisms::spawn_mechanisms,
            ),
        )
        .add_systems(
            FixedUpdate,
            (hazards::blow_wind, mechanisms::move_platforms).run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            (
                track_goal,
                detect_level_exit,
                hazards::spike_damage,
                (mechanisms::read_levers, mechanisms::apply_lever_toggles).chain(),
            )
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_arena(mut commands: Commands) {
    let stone = Color::srgb(0.25, 0.27, 0.33);
    let layers = CollisionLayers::new(
        Layer::World,
        [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink],
    );

    let walls = [
        ("WallTop", Vec2::new(0.0, HALF_H + WALL_THICKNESS * 0.5), Vec2::new(HALF_W * 2.0 + WALL_THICKNESS * 2.0, WALL_THICKNESS)),
        ("WallBottom", Vec2::new(0.0, -HALF_H - WALL_THICKNESS * 0.5), Vec2::new(HALF_W * 2.0 + WALL_THICKNESS * 2.0, WALL_THICKNESS)),
        ("WallLeft", Vec2::new(-HALF_W - WALL_THICKNESS * 0.5, 0.0), Vec2::new(WALL_THICKNESS, HALF_H * 2.0)),
        ("WallRight", Vec2::new(HALF_W + WALL_THICKNESS * 0.5, 0.0), Vec2::new(WALL_THICKNESS, HALF_H * 2.0)),
    ];

    for (name, pos, size) in walls {
        commands.spawn((
            Name::new(name),
            Sprite::from_color(stone, size),
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            layers,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Wooden surfaces arrows stick to.
fn spawn_platforms(mut commands: Commands) {
    let wood = Color::srgb(0.55, 0.36, 0.2);
    let layers = CollisionLayers::new(
        Layer::ArrowSurface,
        [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink],
    );

    let platforms = [
        (Vec2::new(160.0, -330.0), Vec2::new(240.0, 24.0)),
        (Vec2::new(520.0, -120.0), Vec2::new(200.0, 24.0)),
        (Vec2::new(-520.0, -380.0), Vec2::new(24.0, 360.0)),
        (Vec2::new(-120.0, 180.0), Vec2::new(320.0, 24.0)),
    ];

    for (i, (pos, size)) in platforms.into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Platform{i}")),
            Sprite::from_color(wood, size),
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            layers,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

fn spawn_ball_and_goal(mut commands: Commands) {
    commands.spawn((
        Name::new("Ball"),
        Ball,
        Sprite::from_color(Color::srgb(0.9, 0.8, 0.3), Vec2::splat(BALL_RADIUS * 2.0)),
        Transform::from_xyz(0.0, -HALF_H + BALL_RADIUS + 4.0, 1.0),
        RigidBody::Dynamic,
        Collider::circle(BALL_RADIUS),
        Restitution::new(0.4),
        CollisionLayers::new(
            Layer::Prop,
            [Layer::World, Layer::ArrowSurface, Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink, Layer::Trigger],
        ),
        DespawnOnExit(GameState::InGame),
    ));

    let goal_size = Vec2::new(120.0, 100.0);
    commands.spawn((
        Name::new("Goal"),
        Goal,
        Sprite::from_color(Color::srgba(0.3, 0.9, 0.4, 0.25), goal_size),
        Transform::from_xyz(760.0, -HALF_H + goal_size.y * 0.5, 0.5),
        RigidBody::Static,
        Collider::rectangle(goal_size.x, goal_size.y),
        Sensor,
        CollisionEventsEnabled,
        CollisionLayers::new(Layer::Trigger, Layer::Prop),
        DespawnOnExit(GameState::InGame),
    ));

    let exit_size = Vec2::new(40.0, 120.0);
    commands.spawn((
        Name::new("LevelExit"),
        LevelExit,
        Sprite::from_color(Color::srgba(0.9, 0.9, 1.0, 0.2), exit_size),
        Transform::from_xyz(HALF_W - exit_size.x, -HALF_H + exit_size.y * 0.5, 0.5),
        RigidBody::Static,
        Collider::rectangle(exit_size.x, exit_size.y),
        Sensor,
        CollisionEventsEnabled,
        CollisionLayers::new(Layer::Trigger, Layer::Player),
        DespawnOnExit(GameState::InGame),
    ));
}

/// `(sensor, other body)` if exactly one side of the pair matches `is_sensor`.
fn sensor_pair(
    collider1: Entity,
    collider2: Entity,
    body1: Option<Entity>,
    body2: Option<Entity>,
    is_sensor: impl Fn(Entity) -> bool,
) -> Option<Entity> {
    if is_sensor(collider1) {
        Some(body2.unwrap_or(collider2))
    } else if is_sensor(collider2) {
        Some(body1.unwrap_or(collider1))
    } else {
        None
    }
}

fn track_goal(
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    q_goal: Query<(), With<Goal>>,
    q_ball: Query<(), With<Ball>>,
    mut writer: MessageWriter<GoalStateChanged>,
) {
    let is_goal = |e: Entity| q_goal.contains(e);

    for ev in started.read() {
        if let Some(other) = sensor_pair(ev.collider1, ev.collider2, ev.body1, ev.body2, is_goal) {
            if q_ball.contains(other) {
                info!("Ball reached the goal");
                writer.write(GoalStateChanged(true));
            }
        }
    }
    for ev in ended.read() {
        if let Some(other) = sensor_pair(ev.collider1, ev.collider2, ev.body1, ev.body2, is_goal) {
            if q_ball.contains(other) {
                debug!("Ball left the goal");
                writer.write(GoalStateChanged(false));
            }
        }
    }
}

fn detect_level_exit(
    mut started: MessageReader<CollisionStart>,
    q_exit: Query<(), With<LevelExit>>,
    q_player: Query<(), With<Player>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let reached = started.read().any(|ev| {
        sensor_pair(ev.collider1, ev.collider2, ev.body1, ev.body2, |e| q_exit.contains(e))
            .is_some_and(|other| q_player.contains(other))
    });
    if reached {
        info!("Player reached the level exit");
        next.set(GameState::LevelComplete);
    }
}
