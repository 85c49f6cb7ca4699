//! Quivers: per-kind arrow pools with an ammo counter.
//!
//! Invariant: a pooled arrow is
//! - `ArrowState::Preview` with a fresh `Arrow`
//! - hidden, kinematic, velocity = 0
//! - invisible to collisions and ray queries (empty layers)
//!
//! `stash_arrow` is the only writer of that baseline.

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::error::PoolError;
use crate::common::layers::Layer;
use crate::common::level::LevelData;
use crate::common::tunables::Tunables;

use super::components::{ArrowKind, ArrowState, PooledArrow};
use super::lifecycle::Arrow;

/// Free list plus a checked-out set, so nothing is handed out twice or
/// released twice.
#[derive(Debug, Default, Clone)]
pub struct EntityPool {
    free: Vec<Entity>,
    out: HashSet<Entity>,
}

impl EntityPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { free: Vec::with_capacity(capacity), out: HashSet::default() }
    }

    /// Add a new, unused entity.
    pub fn stock(&mut self, e: Entity) {
        self.free.push(e);
    }

    pub fn acquire(&mut self) -> Option<Entity> {
        let e = self.free.pop()?;
        self.out.insert(e);
        Some(e)
    }

    pub fn release(&mut self, e: Entity) -> Result<(), PoolError> {
        if !self.out.remove(&e) {
            return Err(PoolError::NotCheckedOut(e));
        }
        self.free.push(e);
        Ok(())
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn checked_out(&self) -> usize {
        self.out.len()
    }

    pub fn is_checked_out(&self, e: Entity) -> bool {
        self.out.contains(&e)
    }
}

#[derive(Debug, Clone)]
pub struct Quiver {
    pub kind: ArrowKind,
    pub ammo: u32,
    pub pool: EntityPool,
}

impl Quiver {
    pub fn new(kind: ArrowKind, ammo: u32) -> Self {
        Self { kind, ammo, pool: EntityPool::with_capacity(ammo as usize) }
    }

    /// Take an arrow for charging. `None` when out of ammo or arrows.
    pub fn draw(&mut self) -> Option<Entity> {
        if self.ammo == 0 {
            return None;
        }
        let e = self.pool.acquire()?;
        self.ammo -= 1;
        Some(e)
    }

    /// Put an undrawn arrow back and refund its ammo.
    pub fn put_back(&mut self, e: Entity) -> Result<(), PoolError> {
        self.pool.release(e)?;
        self.ammo += 1;
        Ok(())
    }
}

/// All quivers plus the current selection.
#[derive(Resource, Debug, Default)]
pub struct Quivers {
    pub quivers: Vec<Quiver>,
    pub selected: usize,
}

impl Quivers {
    pub fn selected(&self) -> Option<&Quiver> {
        self.quivers.get(self.selected)
    }

    pub fn selected_mut(&mut self) -> Option<&mut Quiver> {
        self.quivers.get_mut(self.selected)
    }

    pub fn by_kind_mut(&mut self, kind: ArrowKind) -> Option<&mut Quiver> {
        self.quivers.iter_mut().find(|q| q.kind == kind)
    }

    /// Step the selection by `step`, wrapping both ways.
    pub fn cycle(&mut self, step: i32) -> Option<ArrowKind> {
        let n = self.quivers.len() as i64;
        if n == 0 {
            return None;
        }
        self.selected = (self.selected as i64 + step as i64).rem_euclid(n) as usize;
        Some(self.quivers[self.selected].kind)
    }
}

#[inline]
pub fn pooled_arrow_layers() -> CollisionLayers {
    CollisionLayers::new(LayerMask::NONE, LayerMask::NONE)
}

#[inline]
pub fn flying_arrow_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Arrow,
        [
            Layer::World,
            Layer::ArrowSurface,
            Layer::Player,
            Layer::Arrow,
            Layer::Prop,
            Layer::ChainLink,
            Layer::Trigger,
        ],
    )
}

/// Spawn one pooled arrow of `kind`.
pub fn spawn_pooled_arrow(commands: &mut Commands, tunables: &Tunables, kind: ArrowKind) -> Entity {
    let length = tunables.meters(0.8);
    let thickness = tunables.meters(0.08);

    commands
        .spawn((
            Name::new(format!("{}(Pooled)", kind.display_name())),
            PooledArrow { kind },
            Arrow::new(kind),
            ArrowState::Preview,
            Sprite {
                color: kind.color(),
                custom_size: Some(Vec2::new(length, thickness * 2.0)),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 3.0),
            Visibility::Hidden,
            RigidBody::Kinematic,
            Collider::rectangle(length, thickness),
            pooled_arrow_layers(),
            Mass(tunables.arrow.mass),
            GravityScale(tunables.arrow.gravity_scale),
            LinearVelocity(Vec2::ZERO),
            AngularVelocity(0.0),
            CollisionEventsEnabled,
        ))
        .id()
}

/// Write the pooled baseline onto `e`.
pub fn stash_arrow(commands: &mut Commands, e: Entity, kind: ArrowKind) {
    commands
        .entity(e)
        .insert((
            Arrow::new(kind),
            ArrowState::Preview,
            Visibility::Hidden,
            RigidBody::Kinematic,
            pooled_arrow_layers(),
            LinearVelocity(Vec2::ZERO),
            AngularVelocity(0.0),
        ))
        .remove::<super::components::Springboard>();
}

/// Stock one quiver per arrow kind from the level's ammo counts.
pub fn stock_quivers(
    mut commands: Commands,
    tunables: Res<Tunables>,
    level: Option<Res<LevelData>>,
    mut quivers: ResMut<Quivers>,
) {
    let level = level.map(|l| l.clone()).unwrap_or_default();
    quivers.quivers.clear();
    quivers.selected = 0;

    for kind in ArrowKind::ALL {
        let ammo = level.arrow_count(kind);
        let mut quiver = Quiver::new(kind, ammo);
        for _ in 0..ammo {
            quiver.pool.stock(spawn_pooled_arrow(&mut commands, &tunables, kind));
        }
        quivers.quivers.push(quiver);
    }

    info!(
        "Stocked quivers: {:?}",
        quivers.quivers.iter().map(|q| (q.kind, q.ammo)).collect::<Vec<_>>()
    );
}
