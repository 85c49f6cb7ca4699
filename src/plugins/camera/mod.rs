//! Camera plugin: a 2D camera that eases toward the archer.
//!
//! A system cannot hold `Query<&Transform>` and `Query<&mut Transform>` at
//! once unless Bevy can prove them disjoint, hence the `Without<...>` filters.
//!
//! ```text
//! OnEnter(InGame): spawn MainCamera
//! PostUpdate:      follow_player (before transform propagation)
//! ```

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::player::Player;

#[derive(Component)]
pub struct MainCamera {
    /// Exponential approach rate, 1/s.
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera)
        .add_systems(
            PostUpdate,
            follow_player
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: 5.0 },
        Transform::from_xyz(0.0, 0.0, 999.0),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Fraction of the remaining distance to cover this frame.
#[inline]
pub fn follow_alpha(responsiveness: f32, dt: f32) -> f32 {
    1.0 - (-responsiveness * dt).exp()
}

fn follow_player(
    time: Res<Time>,
    q_player: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Player>>,
) {
    let Ok(target) = q_player.single() else {
        return;
    };
    let Ok((mut tf, cam)) = q_cam.single_mut() else {
        return;
    };

    let alpha = follow_alpha(cam.responsiveness, time.delta_secs());
    let eased = tf.translation.truncate().lerp(target.translation.truncate(), alpha);
    tf.translation.x = eased.x;
    tf.translation.y = eased.y;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_alpha_is_bounded() {
        assert_eq!(follow_alpha(5.0, 0.0), 0.0);
        let a = follow_alpha(5.0, 1.0 / 60.0);
        assert!(a > 0.0 && a < 1.0);
        assert!(follow_alpha(5.0, 100.0) > 0.999);
    }
}
