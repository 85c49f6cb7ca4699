//! Bow plugin: charge, preview, release.
//!
//! ```text
//!                 ChargeStart (quiver has ammo)
//!        ┌──────┐ ─────────────────────────────► ┌──────────┐
//!        │ Idle │                                │ Charging │ ◄─┐ tick: power, preview pose,
//!        └──────┘ ◄───────────────────────────── └──────────┘ ──┘       trajectory → buffer
//!          ▲  │      Release: fire preview arrow
//!          │  │      Cancel:  arrow back to quiver, ammo refunded
//!          └──┘
//!        Cycle (Idle only): step the quiver selection
//! ```
//!
//! Update pipeline:
//! ```text
//!   read_bow_input ─► BowCommand ─┐
//!   update_aim (cursor → Bow.aim) ├─► apply_bow_commands ─► tick_charge
//!                                 │      │                     │
//!                                 │      ├─ BowEvent           └─ TrajectoryBuffer
//!                                 │      ├─ QuiverUpdated
//!                                 │      └─ BowUiState
//! ```
//!
//! Input is only an adapter: tests and other systems can write `BowCommand`
//! directly.

pub mod buffer;
pub mod controller;
pub mod input;

use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::projectiles::components::ArrowKind;
use crate::plugins::projectiles::pool::{self, Quivers};

pub use buffer::{TrajectoryBuffer, TrajectoryPoint};

/// Power accumulated since the charge started.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChargeState {
    pub elapsed: f32,
    pub power: f32,
}

impl ChargeState {
    /// `power = clamp01(elapsed / charge_time) * max_power`.
    pub fn advance(&mut self, dt: f32, charge_time: f32, max_power: f32) {
        self.elapsed += dt;
        self.power = (self.elapsed / charge_time).clamp(0.0, 1.0) * max_power;
    }
}

/// Firing state carried by the archer.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Bow {
    /// Unit aim direction.
    pub aim: Vec2,
    /// `Some` while charging.
    pub charge: Option<ChargeState>,
    /// The arrow held while charging.
    pub preview: Option<Entity>,
}

impl Default for Bow {
    fn default() -> Self {
        Self { aim: Vec2::X, charge: None, preview: None }
    }
}

impl Bow {
    #[inline]
    pub fn is_charging(&self) -> bool {
        self.charge.is_some()
    }

    /// Where the arrow sits: `offset` in front of the archer, along the aim.
    pub fn spawn_pose(&self, archer: Vec2, offset: f32) -> (Vec2, f32) {
        (archer + self.aim * offset, self.aim.y.atan2(self.aim.x))
    }
}

/// Discrete bow inputs.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BowCommand {
    ChargeStart,
    Release,
    Cancel,
    /// Step the arrow selection (scroll direction).
    Cycle(i32),
}

/// What the bow did, for the tutorial and anything else listening.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BowEvent {
    ChargeStarted(ArrowKind),
    ChargeCancelled(ArrowKind),
    Fired(ArrowKind),
    SelectionChanged(ArrowKind),
}

/// A quiver's ammo changed.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuiverUpdated {
    pub kind: ArrowKind,
    pub ammo: u32,
}

/// Snapshot for the HUD: selected arrow and its ammo.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct BowUiState {
    pub arrow_name: &'static str,
    pub ammo: u32,
}

impl BowUiState {
    pub fn from_quivers(quivers: &Quivers) -> Self {
        quivers
            .selected()
            .map(|q| Self { arrow_name: q.kind.display_name(), ammo: q.ammo })
            .unwrap_or_default()
    }
}

fn refresh_ui_state(quivers: Res<Quivers>, mut ui: ResMut<BowUiState>) {
    *ui = BowUiState::from_quivers(&quivers);
}

pub fn plugin(app: &mut App) {
    app.init_resource::<TrajectoryBuffer>()
        .init_resource::<BowUiState>()
        .add_message::<BowCommand>()
        .add_message::<BowEvent>()
        .add_message::<QuiverUpdated>();

    app.add_systems(
        OnEnter(GameState::InGame),
        refresh_ui_state.after(pool::stock_quivers),
    )
    .add_systems(OnExit(GameState::InGame), controller::disarm_bows);

    app.add_systems(
        Update,
        (
            (input::read_bow_input, input::update_aim),
            controller::apply_bow_commands,
            controller::tick_charge,
        )
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}
