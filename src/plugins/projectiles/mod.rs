//! Projectiles plugin: trajectory prediction, arrow lifecycle, quivers and chains.
//!
//! # Data flow
//! ```text
//!   OnEnter(InGame)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  stock_quivers       LevelData ammo → one pooled arrow per round           │
//!│  stock_chain_links   pre-spawn disabled chain links                        │
//!└────────────────────────────────────────────────────────────────────────────┘
//!
//!   Update (variable dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  bow plugin          draws from Quivers, samples trajectory, fires         │
//!│  release_broken_chains     chain arrow left Embedded → joints gone,        │
//!│                            links back in ChainLinks.pool                   │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  track_arrow_flight  last_velocity + rotation along velocity               │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate (after avian's CollisionEventSystems)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  gather_arrow_contacts   CollisionStart → ArrowContact (normal from arrow) │
//!│  resolve_arrow_contacts  Arrow::on_contact → body / Health writes,         │
//!│                          Springboard insert, ChainAnchorRequest            │
//!│  link_chain_arrows       ChainAnchorRequest → chain or pending anchor      │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pure parts (`trajectory`, `lifecycle`, `EntityPool`/`Quiver`,
//! `ChainLayout`) know nothing about schedules and are tested on their own.

pub mod chain;
pub mod collision;
pub mod components;
pub mod lifecycle;
pub mod pool;
pub mod trajectory;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::RevoluteJoint;
use bevy::prelude::*;

use crate::common::state::GameState;

use chain::{ChainLink, ChainLinks};
use components::PooledArrow;
use pool::Quivers;

pub struct ProjectilesPlugin;

/// Despawn every pooled arrow and chain link when leaving a level.
fn teardown_projectiles(
    mut commands: Commands,
    q: Query<Entity, Or<(With<PooledArrow>, With<ChainLink>, With<RevoluteJoint>)>>,
    mut quivers: ResMut<Quivers>,
    mut links: ResMut<ChainLinks>,
) {
    for e in &q {
        commands.entity(e).despawn();
    }
    *quivers = Quivers::default();
    *links = ChainLinks::default();
}

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Quivers>()
            .init_resource::<ChainLinks>()
            .add_message::<collision::ArrowContact>()
            .add_message::<collision::ChainAnchorRequest>();

        app.add_systems(
            OnEnter(GameState::InGame),
            (pool::stock_quivers, chain::stock_chain_links),
        )
        .add_systems(OnExit(GameState::InGame), teardown_projectiles);

        app.add_systems(
            Update,
            chain::release_broken_chains.run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedUpdate,
            collision::track_arrow_flight.run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedPostUpdate,
            (
                collision::gather_arrow_contacts,
                collision::resolve_arrow_contacts,
                chain::link_chain_arrows,
            )
                .chain()
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
    }
}
