//! Fixed-capacity trajectory buffer read by the preview renderer.

use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::projectiles::trajectory::TrajectorySample;

/// One preview point as the renderer sees it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrajectoryPoint {
    pub position: Vec2,
    pub arc_length_uv: f32,
    pub normalized_arc_length: f32,
}

impl From<&TrajectorySample> for TrajectoryPoint {
    fn from(s: &TrajectorySample) -> Self {
        Self {
            position: s.position.as_vec2(),
            arc_length_uv: s.arc_length_uv as f32,
            normalized_arc_length: s.normalized_arc_length as f32,
        }
    }
}

/// Capacity is fixed when the buffer is created. Slots past `valid_count`
/// repeat the last valid point.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TrajectoryBuffer {
    points: Vec<TrajectoryPoint>,
    valid_count: usize,
    show: bool,
}

impl TrajectoryBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: vec![TrajectoryPoint::default(); capacity],
            valid_count: 0,
            show: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    /// Whether the renderer should draw the buffer at all.
    pub fn is_shown(&self) -> bool {
        self.show && self.valid_count > 0
    }

    /// The whole buffer, padding included.
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn valid_points(&self) -> &[TrajectoryPoint] {
        &self.points[..self.valid_count]
    }

    /// Replace the contents with `samples`, truncated to capacity.
    pub fn write(&mut self, samples: &[TrajectorySample]) {
        let n = samples.len().min(self.points.len());
        if n == 0 {
            self.clear();
            return;
        }

        for (slot, sample) in self.points.iter_mut().zip(&samples[..n]) {
            *slot = sample.into();
        }
        let last = self.points[n - 1];
        self.points[n..].fill(last);
        self.valid_count = n;
        self.show = true;
    }

    pub fn clear(&mut self) {
        self.valid_count = 0;
        self.show = false;
    }
}

impl FromWorld for TrajectoryBuffer {
    fn from_world(world: &mut World) -> Self {
        let capacity = world
            .get_resource::<Tunables>()
            .map_or(Tunables::default().bow.trajectory_point_count, |t| t.bow.trajectory_point_count);
        Self::with_capacity(capacity as usize)
    }
}
