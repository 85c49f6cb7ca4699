//! Trajectory preview: a fixed set of dot sprites laid along the predicted
//! path, one per whole dash period of arc length, fading toward the end.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::bow::{TrajectoryBuffer, TrajectoryPoint};

const DOT_SIZE: f32 = 4.0;

#[derive(Component, Debug)]
pub struct TrajectoryDot(pub usize);

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_dots).add_systems(
        PostUpdate,
        place_dots
            .before(TransformSystems::Propagate)
            .run_if(in_state(GameState::InGame)),
    );
}

fn spawn_dots(mut commands: Commands, buffer: Res<TrajectoryBuffer>) {
    for i in 0..buffer.capacity() {
        commands.spawn((
            Name::new(format!("TrajectoryDot{i}")),
            TrajectoryDot(i),
            Sprite::from_color(Color::WHITE, Vec2::splat(DOT_SIZE)),
            Transform::from_xyz(0.0, 0.0, 5.0),
            Visibility::Hidden,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Dots where the arc length crosses each whole dash period, with the
/// normalized arc length at that spot. At most `max` dots.
pub fn dash_points(points: &[TrajectoryPoint], max: usize) -> Vec<(Vec2, f32)> {
    let mut dots = Vec::new();
    let Some(first) = points.first() else {
        return dots;
    };
    if first.arc_length_uv.fract() == 0.0 {
        dots.push((first.position, first.normalized_arc_length));
    }

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let span = b.arc_length_uv - a.arc_length_uv;
        if span <= 0.0 {
            continue;
        }
        let mut k = a.arc_length_uv.floor() + 1.0;
        while k <= b.arc_length_uv && dots.len() < max {
            let t = (k - a.arc_length_uv) / span;
            dots.push((
                a.position.lerp(b.position, t),
                a.normalized_arc_length + (b.normalized_arc_length - a.normalized_arc_length) * t,
            ));
            k += 1.0;
        }
    }
    dots.truncate(max);
    dots
}

fn place_dots(
    buffer: Res<TrajectoryBuffer>,
    mut q_dots: Query<(&TrajectoryDot, &mut Transform, &mut Visibility, &mut Sprite)>,
) {
    if !buffer.is_changed() {
        return;
    }
    let dots = if buffer.is_shown() {
        dash_points(buffer.valid_points(), buffer.capacity())
    } else {
        Vec::new()
    };

    for (dot, mut tf, mut vis, mut sprite) in &mut q_dots {
        match dots.get(dot.0) {
            Some(&(pos, along)) => {
                tf.translation.x = pos.x;
                tf.translation.y = pos.y;
                sprite.color = Color::srgba(1.0, 1.0, 1.0, 1.0 - 0.8 * along);
                *vis = Visibility::Visible;
            }
            None => *vis = Visibility::Hidden,
        }
    }
}
