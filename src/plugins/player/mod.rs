//! Player plugin: the archer.
//!
//! Pipeline:
//! - Update: sample keyboard into `PlayerInput`, announce `PlayerMoved` when movement starts
//! - FixedUpdate: refresh `Grounded` from the ground probe, accelerate toward the
//!   target speed, jump (announcing `PlayerJumped`)
//! - Update: an archer whose `Health` hits zero sends the game to `Respawning`
//!
//! The archer's collider is the body the trajectory preview passes through.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{layers::Layer, state::GameState, tunables::Tunables};
use crate::plugins::bow::Bow;
use crate::plugins::projectiles::components::Health;

#[derive(Component)]
pub struct Player;

/// Present while the ground probe touches something.
#[derive(Component, Debug, Default)]
pub struct Grounded;

/// The archer started moving.
#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerMoved;

/// The archer left the ground by jumping.
#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerJumped;

#[derive(Resource, Default, Debug)]
pub(crate) struct PlayerInput {
    move_x: f32,
    jump: bool,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_message::<PlayerMoved>()
        .add_message::<PlayerJumped>()
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            Update,
            (gather_input, detect_death).run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedUpdate,
            (update_grounded, apply_movement)
                .chain()
                .run_if(in_state(GameState::InGame)),
        );
}

const RADIUS: f32 = 10.0;
const HEIGHT: f32 = 20.0;

fn spawn(mut commands: Commands, tunables: Res<Tunables>) {
    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::ArrowSurface, Layer::Arrow, Layer::Prop, Layer::ChainLink, Layer::Trigger],
    );
    let ground_probe = ShapeCaster::new(Collider::circle(RADIUS * 0.9), Vec2::ZERO, 0.0, Dir2::NEG_Y)
        .with_max_distance(HEIGHT * 0.5 + 2.0)
        .with_query_filter(SpatialQueryFilter::from_mask([
            Layer::World,
            Layer::ArrowSurface,
            Layer::Arrow,
            Layer::Prop,
            Layer::ChainLink,
        ]));

    commands.spawn((
        Name::new("Player"),
        Player,
        Bow::default(),
        Health::new(tunables.player.max_hp),
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::new(RADIUS * 2.0, HEIGHT + RADIUS * 2.0)),
            ..default()
        },
        Transform::from_xyz(-240.0, -120.0, 1.0),
        RigidBody::Dynamic,
        Collider::capsule(RADIUS, HEIGHT),
        LockedAxes::ROTATION_LOCKED,
        Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
        layers,
        ground_probe,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));
}

fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut input: ResMut<PlayerInput>,
    mut moved: MessageWriter<PlayerMoved>,
) {
    let Some(keys) = keys else {
        return;
    };

    let mut axis = 0.0;
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        axis -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        axis += 1.0;
    }

    if axis != 0.0 && input.move_x == 0.0 {
        moved.write(PlayerMoved);
    }
    input.move_x = axis;

    if keys.any_just_pressed([KeyCode::Space, KeyCode::KeyW, KeyCode::ArrowUp]) {
        input.jump = true;
    }
}

fn update_grounded(mut commands: Commands, q: Query<(Entity, &ShapeHits, Has<Grounded>), With<Player>>) {
    for (e, hits, grounded) in &q {
        match (hits.is_empty(), grounded) {
            (false, false) => {
                commands.entity(e).insert(Grounded);
            }
            (true, true) => {
                commands.entity(e).remove::<Grounded>();
            }
            _ => {}
        }
    }
}

/// Move `current` toward `target` by at most `max_delta`.
#[inline]
fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

fn apply_movement(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut input: ResMut<PlayerInput>,
    mut q_player: Query<(&mut LinearVelocity, Has<Grounded>), With<Player>>,
    mut jumped: MessageWriter<PlayerJumped>,
) {
    let jump = std::mem::take(&mut input.jump);
    let Ok((mut vel, grounded)) = q_player.single_mut() else {
        return;
    };

    let p = &tunables.player;
    let accel = if grounded { p.ground_acceleration } else { p.air_acceleration };
    let target = input.move_x * tunables.meters(p.speed);
    vel.x = approach(vel.x, target, tunables.meters(accel) * time.delta_secs());

    if jump && grounded {
        vel.y = tunables.meters(p.jump_speed);
        jumped.write(PlayerJumped);
    }
}

fn detect_death(
    q_player: Query<(Entity, &Health), (With<Player>, Changed<Health>)>,
    mut next: ResMut<NextState<GameState>>,
) {
    for (e, hp) in &q_player {
        if hp.is_dead() {
            info!("Archer {e:?} died, restarting the level");
            next.set(GameState::Respawning);
        } else {
            debug!("Archer {e:?} at {}/{} hp", hp.hp, hp.max_hp);
        }
    }
}
