//! Ballistic trajectory prediction.
//!
//! Closed-form arc, sampled at fixed time steps, with each step's chord tested
//! for occlusion. The firer's own collider is passed through; anything else
//! truncates the path at the hit point.
//!
//! ```text
//!   p(t) = launch + v·t − ½·g·t²·ŷ        (gravity is vertical only)
//!
//!   s0 ──chord── s1 ──chord── s2 ──chord──x hit      (path ends at hit point)
//!                  ▲
//!                  └─ hit on the firer's own body: ignored, keep going
//! ```
//!
//! The sampler works in `f64` and is generic over [`OcclusionQuery`] so it can
//! be driven by avian's spatial query in-game and by fake geometry in tests.

use avian2d::prelude::*;
use bevy::math::DVec2;
use bevy::prelude::*;

use crate::common::error::TrajectoryError;

/// Chords shorter than this are not raycast.
pub const MIN_SEGMENT: f64 = 1e-3;

/// Nearest hit reported by an occlusion query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: DVec2,
    pub collider: Entity,
}

/// "Cast a ray from `origin` along `direction` up to `max_distance`, return
/// the nearest hit." Layer filtering is the implementor's business.
pub trait OcclusionQuery {
    fn cast_ray(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Option<RayHit>;

    /// True if nothing blocks the straight segment `from → to`.
    fn line_of_sight(&self, from: DVec2, to: DVec2) -> bool {
        let delta = to - from;
        let len = delta.length();
        if len <= MIN_SEGMENT {
            return true;
        }
        self.cast_ray(from, delta / len, len).is_none()
    }
}

/// Occlusion oracle that never hits anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSky;

impl OcclusionQuery for OpenSky {
    fn cast_ray(&self, _: DVec2, _: DVec2, _: f64) -> Option<RayHit> {
        None
    }
}

/// Avian-backed occlusion: rays against solid colliders on the filter's mask.
pub struct PhysicsOcclusion<'a, 'w, 's> {
    pub spatial: &'a SpatialQuery<'w, 's>,
    pub filter: SpatialQueryFilter,
}

impl OcclusionQuery for PhysicsOcclusion<'_, '_, '_> {
    fn cast_ray(&self, origin: DVec2, direction: DVec2, max_distance: f64) -> Option<RayHit> {
        let dir = Dir2::new(direction.as_vec2()).ok()?;
        let origin = origin.as_vec2();
        self.spatial
            .cast_ray(origin, dir, max_distance as f32, true, &self.filter)
            .map(|hit| RayHit {
                point: (origin + *dir * hit.distance).as_dvec2(),
                collider: hit.entity,
            })
    }
}

/// Validated sampling parameters: how many points, how far apart in time,
/// and the dash period used for `arc_length_uv`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryConfig {
    sample_count: usize,
    time_step: f64,
    dot_spacing: f64,
}

impl TrajectoryConfig {
    pub fn new(sample_count: usize, time_step: f64, dot_spacing: f64) -> Result<Self, TrajectoryError> {
        if sample_count == 0 {
            return Err(TrajectoryError::ZeroSampleCount);
        }
        if !(time_step > 0.0) {
            return Err(TrajectoryError::NonPositiveTimeStep(time_step));
        }
        if !(dot_spacing > 0.0) {
            return Err(TrajectoryError::NonPositiveDotSpacing(dot_spacing));
        }
        Ok(Self { sample_count, time_step, dot_spacing })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn dot_spacing(&self) -> f64 {
        self.dot_spacing
    }
}

/// One shot to predict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FireRequest {
    pub launch_pos: DVec2,
    /// Launch direction; normalized by the sampler.
    pub right: DVec2,
    /// `base_force * power_fraction`.
    pub speed: f64,
    /// Downward acceleration magnitude.
    pub gravity: f64,
}

impl FireRequest {
    pub fn launch_velocity(&self) -> DVec2 {
        self.right.normalize_or_zero() * self.speed
    }

    /// Unobstructed position `t` seconds after launch.
    pub fn ideal_position(&self, t: f64) -> DVec2 {
        let mut p = self.launch_pos + self.launch_velocity() * t;
        p.y -= 0.5 * self.gravity * t * t;
        p
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectorySample {
    pub position: DVec2,
    /// Cumulative distance from launch.
    pub distance: f64,
    /// `distance / dot_spacing`.
    pub arc_length_uv: f64,
    /// `distance / total`, or 0 when the path has no length.
    pub normalized_arc_length: f64,
}

/// Predict the path of `request`.
///
/// Always yields at least the launch point and at most
/// `config.sample_count()` samples. Hits on `excluded` don't stop the path.
pub fn sample<Q: OcclusionQuery + ?Sized>(
    request: &FireRequest,
    config: &TrajectoryConfig,
    occlusion: &Q,
    excluded: Option<Entity>,
) -> Vec<TrajectorySample> {
    let mut points: Vec<(DVec2, f64)> = Vec::with_capacity(config.sample_count);
    let mut previous = request.launch_pos;
    let mut travelled = 0.0;
    points.push((previous, 0.0));

    for i in 1..config.sample_count {
        let t = i as f64 * config.time_step;
        let ideal = request.ideal_position(t);
        let delta = ideal - previous;
        let len = delta.length();

        if len > MIN_SEGMENT {
            if let Some(hit) = occlusion.cast_ray(previous, delta / len, len) {
                if Some(hit.collider) != excluded {
                    travelled += previous.distance(hit.point);
                    points.push((hit.point, travelled));
                    break;
                }
            }
        }

        travelled += len;
        points.push((ideal, travelled));
        previous = ideal;
    }

    let total = travelled;
    points
        .into_iter()
        .map(|(position, distance)| TrajectorySample {
            position,
            distance,
            arc_length_uv: distance / config.dot_spacing,
            normalized_arc_length: if total > 0.0 { distance / total } else { 0.0 },
        })
        .collect()
}
