//! Firing controller systems.
//!
//! The preview arrow is drawn from the selected quiver on `ChargeStart` and
//! either fired or put back; it is never held across a level change.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::trajectory_mask;
use crate::common::tunables::Tunables;
use crate::plugins::projectiles::components::ArrowState;
use crate::plugins::projectiles::lifecycle::Arrow;
use crate::plugins::projectiles::pool::{flying_arrow_layers, pooled_arrow_layers, stash_arrow, Quivers};
use crate::plugins::projectiles::trajectory::{
    self, FireRequest, OcclusionQuery, PhysicsOcclusion, TrajectoryConfig,
};

use super::{Bow, BowCommand, BowEvent, BowUiState, ChargeState, QuiverUpdated, TrajectoryBuffer};

/// Launch speed in solver units for `power`: impulse over mass.
#[inline]
pub fn launch_speed(tunables: &Tunables, power: f32) -> f32 {
    tunables.meters(tunables.arrow.fire_force) * power / tunables.arrow.mass
}

pub fn fire_request(tunables: &Tunables, position: Vec2, aim: Vec2, power: f32) -> FireRequest {
    FireRequest {
        launch_pos: position.as_dvec2(),
        right: aim.as_dvec2(),
        speed: launch_speed(tunables, power) as f64,
        gravity: (tunables.meters(tunables.gravity) * tunables.arrow.gravity_scale) as f64,
    }
}

pub fn apply_bow_commands(
    mut commands: Commands,
    time: Res<Time<Virtual>>,
    tunables: Res<Tunables>,
    mut reader: MessageReader<BowCommand>,
    mut quivers: ResMut<Quivers>,
    mut buffer: ResMut<TrajectoryBuffer>,
    mut ui: ResMut<BowUiState>,
    mut q_bow: Query<(Entity, &mut Bow, &Transform)>,
    mut q_arrows: Query<(&mut Arrow, &mut ArrowState, &mut Transform), Without<Bow>>,
    mut events: MessageWriter<BowEvent>,
    mut ammo: MessageWriter<QuiverUpdated>,
) {
    let Ok((archer, mut bow, archer_tf)) = q_bow.single_mut() else {
        reader.clear();
        return;
    };
    let archer_pos = archer_tf.translation.truncate();

    for cmd in reader.read() {
        match *cmd {
            BowCommand::ChargeStart => {
                if bow.is_charging() {
                    continue;
                }
                let Some(quiver) = quivers.selected_mut() else {
                    debug!("ChargeStart with no quivers");
                    continue;
                };
                let kind = quiver.kind;
                let Some(arrow) = quiver.draw() else {
                    debug!("{} quiver is empty", kind.display_name());
                    continue;
                };

                let (pos, angle) = bow.spawn_pose(archer_pos, tunables.meters(tunables.bow.spawn_offset));
                if let Ok((_, _, mut tf)) = q_arrows.get_mut(arrow) {
                    tf.translation = pos.extend(tf.translation.z);
                    tf.rotation = Quat::from_rotation_z(angle);
                }
                commands
                    .entity(arrow)
                    .insert((Visibility::Visible, RigidBody::Kinematic, pooled_arrow_layers()));

                bow.charge = Some(ChargeState::default());
                bow.preview = Some(arrow);
                events.write(BowEvent::ChargeStarted(kind));
            }

            BowCommand::Release => {
                let (Some(charge), Some(preview)) = (bow.charge.take(), bow.preview.take()) else {
                    debug!("Release while idle");
                    continue;
                };
                buffer.clear();

                let Ok((mut arrow, mut state, _)) = q_arrows.get_mut(preview) else {
                    warn!("Preview arrow {preview:?} vanished before release");
                    continue;
                };
                let kind = arrow.kind;
                if !arrow.fire(&mut state, bow.aim, time.elapsed_secs(), Some(archer)) {
                    warn!("Preview arrow {preview:?} was not in Preview");
                    continue;
                }

                let velocity = bow.aim * launch_speed(&tunables, charge.power);
                arrow.last_velocity = velocity;
                commands.entity(preview).insert((
                    RigidBody::Dynamic,
                    flying_arrow_layers(),
                    LinearVelocity(velocity),
                    AngularVelocity(0.0),
                ));

                if let Some(q) = quivers.by_kind_mut(kind) {
                    ammo.write(QuiverUpdated { kind, ammo: q.ammo });
                }
                *ui = BowUiState::from_quivers(&quivers);
                events.write(BowEvent::Fired(kind));
                debug!("Fired {} at power {:.2}", kind.display_name(), charge.power);
            }

            BowCommand::Cancel => {
                let (Some(_), Some(preview)) = (bow.charge.take(), bow.preview.take()) else {
                    continue;
                };
                buffer.clear();

                let Ok((arrow, _, _)) = q_arrows.get(preview) else {
                    warn!("Preview arrow {preview:?} vanished before cancel");
                    continue;
                };
                let kind = arrow.kind;
                stash_arrow(&mut commands, preview, kind);

                if let Some(q) = quivers.by_kind_mut(kind) {
                    if let Err(e) = q.put_back(preview) {
                        warn!("Cancelled arrow not returned: {e}");
                    }
                    ammo.write(QuiverUpdated { kind, ammo: q.ammo });
                }
                *ui = BowUiState::from_quivers(&quivers);
                events.write(BowEvent::ChargeCancelled(kind));
            }

            BowCommand::Cycle(step) => {
                if bow.is_charging() {
                    continue;
                }
                if let Some(kind) = quivers.cycle(step) {
                    *ui = BowUiState::from_quivers(&quivers);
                    events.write(BowEvent::SelectionChanged(kind));
                }
            }
        }
    }
}

/// Advance every charging bow: power, preview pose, predicted path.
pub fn advance_charge<Q: OcclusionQuery + ?Sized>(
    dt: f32,
    tunables: &Tunables,
    occlusion: &Q,
    buffer: &mut TrajectoryBuffer,
    q_bow: &mut Query<(Entity, &mut Bow, &Transform)>,
    q_preview: &mut Query<&mut Transform, (With<Arrow>, Without<Bow>)>,
) {
    let config = match TrajectoryConfig::new(
        tunables.bow.trajectory_point_count as usize,
        tunables.bow.trajectory_point_time,
        tunables.bow.dot_spacing,
    ) {
        Ok(c) => c,
        Err(e) => {
            warn!("Trajectory preview disabled: {e}");
            buffer.clear();
            return;
        }
    };

    for (archer, mut bow, archer_tf) in q_bow.iter_mut() {
        let Some(charge) = bow.charge.as_mut() else {
            continue;
        };
        charge.advance(dt, tunables.bow.charge_time, tunables.bow.max_power);
        let power = charge.power;

        let (pos, angle) = bow.spawn_pose(archer_tf.translation.truncate(), tunables.meters(tunables.bow.spawn_offset));
        if let Some(mut tf) = bow.preview.and_then(|e| q_preview.get_mut(e).ok()) {
            tf.translation = pos.extend(tf.translation.z);
            tf.rotation = Quat::from_rotation_z(angle);
        }

        let request = fire_request(tunables, pos, bow.aim, power);
        let samples = trajectory::sample(&request, &config, occlusion, Some(archer));
        buffer.write(&samples);
    }
}

pub fn tick_charge(
    time: Res<Time>,
    tunables: Res<Tunables>,
    spatial: SpatialQuery,
    mut buffer: ResMut<TrajectoryBuffer>,
    mut q_bow: Query<(Entity, &mut Bow, &Transform)>,
    mut q_preview: Query<&mut Transform, (With<Arrow>, Without<Bow>)>,
) {
    let occlusion = PhysicsOcclusion {
        spatial: &spatial,
        filter: SpatialQueryFilter::from_mask(trajectory_mask()),
    };
    advance_charge(time.delta_secs(), &tunables, &occlusion, &mut buffer, &mut q_bow, &mut q_preview);
}

/// Drop any charge in progress; the held arrow is torn down with the level.
pub fn disarm_bows(mut q_bow: Query<&mut Bow>, mut buffer: ResMut<TrajectoryBuffer>) {
    for mut bow in &mut q_bow {
        bow.charge = None;
        bow.preview = None;
    }
    buffer.clear();
}
