//! Levers and the doors and lifts they drive.
//!
//! A lever is a dynamic bar hinged to a static pivot. It flips once the hinge
//! swings past the middle of its limits, and every `Door` and
//! `MovingPlatform` wired to it follows.
//!
//! ```text
//!   lever angle ─► read_levers ─► LeverToggled ─► apply_lever_toggles ─► Door / MovingPlatform
//!   MovingPlatform progress ─► move_platforms ─► kinematic LinearVelocity
//! ```

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;

use super::{HALF_H, HALF_W};

const LEVER_LENGTH: f32 = 80.0;
const LEVER_LIMIT: f32 = std::f32::consts::FRAC_PI_4;

#[derive(Component, Debug, Clone, Copy)]
pub struct Lever {
    pub min_angle: f32,
    pub max_angle: f32,
    pub engaged: bool,
}

impl Lever {
    pub fn new(min_angle: f32, max_angle: f32, start_angle: f32) -> Self {
        let mut lever = Self { min_angle, max_angle, engaged: false };
        lever.engaged = lever.engaged_at(start_angle);
        lever
    }

    /// Past the middle of the hinge travel.
    #[inline]
    pub fn engaged_at(&self, angle: f32) -> bool {
        angle > (self.min_angle + self.max_angle) * 0.5
    }
}

/// A lever flipped.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeverToggled {
    pub lever: Entity,
    pub engaged: bool,
}

/// Solid while closed; no collider and hidden while open.
#[derive(Component, Debug)]
pub struct Door {
    pub lever: Entity,
    pub open: bool,
}

/// Kinematic lift that eases along a cubic Bézier between `start` and `end`.
#[derive(Component, Debug, Clone)]
pub struct MovingPlatform {
    pub lever: Entity,
    pub start: Vec2,
    pub end: Vec2,
    /// Control point offsets from `start` and `end`.
    pub tangent_start: Vec2,
    pub tangent_end: Vec2,
    /// Seconds for a full trip.
    pub move_time: f32,
    /// 0 at `start`, 1 at `end`, before easing.
    pub progress: f32,
    pub toward_end: bool,
}

impl MovingPlatform {
    /// Step `progress` toward the current target and return the new position.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        if self.move_time > 0.0 {
            let target = if self.toward_end { 1.0 } else { 0.0 };
            self.progress = move_towards(self.progress, target, dt / self.move_time);
        }
        self.position()
    }

    pub fn position(&self) -> Vec2 {
        cubic_bezier(
            smoothstep(self.progress),
            self.start,
            self.start + self.tangent_start,
            self.end + self.tangent_end,
            self.end,
        )
    }
}

#[inline]
fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn cubic_bezier(t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

pub(super) fn spawn_mechanisms(mut commands: Commands) {
    let pivot_pos = Vec2::new(-420.0, -HALF_H);
    let start_angle = -LEVER_LIMIT * 0.8;

    let pivot = commands
        .spawn((
            Name::new("LeverPivot"),
            Transform::from_translation(pivot_pos.extend(0.5)),
            RigidBody::Static,
            DespawnOnExit(GameState::InGame),
        ))
        .id();

    let half = Vec2::new(0.0, LEVER_LENGTH * 0.5);
    let bar_pos = pivot_pos + Vec2::from_angle(start_angle).rotate(half);
    let lever = commands
        .spawn((
            Name::new("Lever"),
            Lever::new(-LEVER_LIMIT, LEVER_LIMIT, start_angle),
            Sprite::from_color(Color::srgb(0.75, 0.5, 0.25), Vec2::new(10.0, LEVER_LENGTH)),
            Transform::from_translation(bar_pos.extend(0.8)).with_rotation(Quat::from_rotation_z(start_angle)),
            Rotation::radians(start_angle),
            RigidBody::Dynamic,
            Collider::rectangle(10.0, LEVER_LENGTH),
            CollisionLayers::new(Layer::Prop, [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink]),
            DespawnOnExit(GameState::InGame),
        ))
        .id();

    commands.spawn((
        Name::new("LeverHinge"),
        RevoluteJoint::new(pivot, lever)
            .with_local_anchor2(-half)
            .with_angle_limits(-LEVER_LIMIT, LEVER_LIMIT),
        DespawnOnExit(GameState::InGame),
    ));

    let door_size = Vec2::new(24.0, 160.0);
    commands.spawn((
        Name::new("ExitDoor"),
        Door { lever, open: false },
        Sprite::from_color(Color::srgb(0.35, 0.3, 0.3), door_size),
        Transform::from_xyz(HALF_W - 120.0, -HALF_H + door_size.y * 0.5, 0.5),
        RigidBody::Static,
        Collider::rectangle(door_size.x, door_size.y),
        CollisionLayers::new(Layer::World, [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink]),
        DespawnOnExit(GameState::InGame),
    ));

    let lift_size = Vec2::new(140.0, 20.0);
    let platform = MovingPlatform {
        lever,
        start: Vec2::new(560.0, -HALF_H + 40.0),
        end: Vec2::new(560.0, -180.0),
        tangent_start: Vec2::new(60.0, 0.0),
        tangent_end: Vec2::new(-60.0, 0.0),
        move_time: 2.0,
        progress: 0.0,
        toward_end: false,
    };
    commands.spawn((
        Name::new("Lift"),
        Sprite::from_color(Color::srgb(0.3, 0.32, 0.38), lift_size),
        Transform::from_translation(platform.start.extend(0.5)),
        platform,
        RigidBody::Kinematic,
        Collider::rectangle(lift_size.x, lift_size.y),
        LinearVelocity::ZERO,
        CollisionLayers::new(Layer::World, [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink]),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Flip levers whose hinge crossed the midpoint. The pivot never rotates, so
/// the bar's own rotation is the joint angle.
pub(super) fn read_levers(mut q_levers: Query<(Entity, &mut Lever, &Rotation)>, mut writer: MessageWriter<LeverToggled>) {
    for (e, mut lever, rot) in &mut q_levers {
        let engaged = lever.engaged_at(rot.as_radians());
        if engaged != lever.engaged {
            lever.engaged = engaged;
            info!("Lever {e:?} {}", if engaged { "engaged" } else { "released" });
            writer.write(LeverToggled { lever: e, engaged });
        }
    }
}

pub(super) fn apply_lever_toggles(
    mut commands: Commands,
    mut toggles: MessageReader<LeverToggled>,
    mut q_doors: Query<(Entity, &mut Door, &mut Visibility)>,
    mut q_platforms: Query<&mut MovingPlatform>,
) {
    for toggle in toggles.read() {
        for (e, mut door, mut vis) in &mut q_doors {
            if door.lever != toggle.lever || door.open == toggle.engaged {
                continue;
            }
            door.open = toggle.engaged;
            if door.open {
                commands.entity(e).insert(ColliderDisabled);
                *vis = Visibility::Hidden;
            } else {
                commands.entity(e).remove::<ColliderDisabled>();
                *vis = Visibility::Inherited;
            }
            debug!("Door {e:?} open: {}", door.open);
        }
        for mut platform in &mut q_platforms {
            if platform.lever == toggle.lever {
                platform.toward_end = toggle.engaged;
            }
        }
    }
}

/// Drive kinematic lifts by velocity so bodies riding them are carried along.
pub(super) fn move_platforms(
    time: Res<Time>,
    mut q_platforms: Query<(&mut MovingPlatform, &Transform, &mut LinearVelocity)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for (mut platform, tf, mut vel) in &mut q_platforms {
        let target = platform.advance(dt);
        vel.0 = (target - tf.translation.truncate()) / dt;
    }
}
