//! Spikes and wind.
//!
//! A spike hurts whatever `Health` touches it. A wind area is a sensor that
//! accelerates every dynamic body inside it, arrows in flight included.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::projectiles::components::Health;

use super::HALF_H;

#[derive(Component, Debug, Clone, Copy)]
pub struct Spike {
    pub damage: u32,
}

impl Default for Spike {
    fn default() -> Self {
        Self { damage: 100 }
    }
}

/// Constant acceleration applied to dynamic bodies inside the area, px/s².
#[derive(Component, Debug, Clone, Copy)]
pub struct WindArea {
    pub acceleration: Vec2,
}

pub(super) fn spawn_hazards(mut commands: Commands) {
    let spike_size = Vec2::new(96.0, 16.0);
    commands.spawn((
        Name::new("Spikes"),
        Spike::default(),
        Sprite::from_color(Color::srgb(0.7, 0.7, 0.75), spike_size),
        Transform::from_xyz(400.0, -HALF_H + spike_size.y * 0.5, 0.5),
        RigidBody::Static,
        Collider::rectangle(spike_size.x, spike_size.y),
        CollisionEventsEnabled,
        CollisionLayers::new(Layer::World, [Layer::Player, Layer::Arrow, Layer::Prop, Layer::ChainLink]),
        DespawnOnExit(GameState::InGame),
    ));

    let wind_size = Vec2::new(160.0, 520.0);
    commands.spawn((
        Name::new("Updraft"),
        WindArea { acceleration: Vec2::new(0.0, 260.0) },
        Sprite::from_color(Color::srgba(0.7, 0.85, 1.0, 0.12), wind_size),
        Transform::from_xyz(-800.0, -HALF_H + wind_size.y * 0.5, 0.2),
        RigidBody::Static,
        Collider::rectangle(wind_size.x, wind_size.y),
        Sensor,
        CollidingEntities::default(),
        CollisionLayers::new(Layer::Trigger, [Layer::Player, Layer::Arrow, Layer::Prop]),
        DespawnOnExit(GameState::InGame),
    ));
}

pub(super) fn spike_damage(
    mut started: MessageReader<CollisionStart>,
    q_spikes: Query<&Spike>,
    mut q_health: Query<&mut Health>,
) {
    for ev in started.read() {
        let sides = [
            (ev.collider1, ev.body2.unwrap_or(ev.collider2)),
            (ev.collider2, ev.body1.unwrap_or(ev.collider1)),
        ];
        for (spike_e, victim) in sides {
            let Ok(spike) = q_spikes.get(spike_e) else {
                continue;
            };
            if let Ok(mut hp) = q_health.get_mut(victim) {
                hp.damage(spike.damage);
                debug!("Spike {spike_e:?} hit {victim:?}, {} hp left", hp.hp);
            }
        }
    }
}

pub(super) fn blow_wind(
    time: Res<Time>,
    q_wind: Query<(&WindArea, &CollidingEntities)>,
    mut q_bodies: Query<(&RigidBody, &mut LinearVelocity)>,
) {
    let dt = time.delta_secs();
    for (wind, inside) in &q_wind {
        for &e in inside.iter() {
            let Ok((body, mut vel)) = q_bodies.get_mut(e) else {
                continue;
            };
            if body.is_dynamic() {
                vel.0 += wind.acceleration * dt;
            }
        }
    }
}
