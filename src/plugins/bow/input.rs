//! Mouse → `BowCommand` adapter, and cursor aim.
//!
//! Hold right mouse to draw, click left to loose, let go of right without
//! firing to put the arrow back. The wheel cycles arrow kinds.

use bevy::input::mouse::AccumulatedMouseScroll;
use bevy::prelude::*;

use crate::plugins::camera::MainCamera;

use super::{Bow, BowCommand};

pub fn read_bow_input(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    scroll: Option<Res<AccumulatedMouseScroll>>,
    mut writer: MessageWriter<BowCommand>,
) {
    if let Some(buttons) = buttons {
        if buttons.just_pressed(MouseButton::Right) {
            writer.write(BowCommand::ChargeStart);
        }
        if buttons.just_pressed(MouseButton::Left) && buttons.pressed(MouseButton::Right) {
            writer.write(BowCommand::Release);
        }
        if buttons.just_released(MouseButton::Right) {
            writer.write(BowCommand::Cancel);
        }
    }

    if let Some(scroll) = scroll {
        if scroll.delta.y != 0.0 {
            writer.write(BowCommand::Cycle(scroll.delta.y.signum() as i32));
        }
    }
}

/// Pull-back aiming: the bow points from the cursor through the archer.
pub fn aim_from_cursor(archer: Vec2, cursor_world: Vec2) -> Option<Vec2> {
    (archer - cursor_world).try_normalize()
}

pub fn update_aim(
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut q_bow: Query<(&mut Bow, &Transform)>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_tf)) = q_camera.single() else {
        return;
    };
    let world_cursor = match camera.viewport_to_world_2d(camera_tf, cursor) {
        Ok(p) => p,
        Err(e) => {
            debug!("viewport_to_world_2d failed: {e:?}");
            return;
        }
    };

    for (mut bow, tf) in &mut q_bow {
        if let Some(aim) = aim_from_cursor(tf.translation.truncate(), world_cursor) {
            bow.aim = aim;
        }
    }
}
