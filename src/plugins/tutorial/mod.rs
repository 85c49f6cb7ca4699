//! Tutorial plugin: runs the step list on the tutorial level.
//!
//! ```text
//!   PlayerMoved / PlayerJumped / BowEvent / GoalStateChanged
//!        │ forward_tutorial_events
//!        ▼
//!   TutorialSequencer ◄── skip_tutorial_step (Tab)
//!        │ tick_tutorial
//!        ▼
//!   TutorialCue ─► show_tutorial_text ─► TutorialText
//! ```

pub mod script;
pub mod sequencer;

use bevy::prelude::*;

use crate::common::level::CurrentLevel;
use crate::common::state::GameState;
use crate::plugins::bow::BowEvent;
use crate::plugins::player::{PlayerJumped, PlayerMoved};
use crate::plugins::world::GoalStateChanged;

pub use script::{default_tutorial, FADE_SECONDS};
pub use sequencer::{TutorialCue, TutorialEvent, TutorialEventKind, TutorialSequencer, TutorialStep};

/// Text the tutorial currently wants on screen.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialText(pub Option<String>);

pub fn plugin(app: &mut App) {
    app.init_resource::<TutorialText>()
        .add_message::<TutorialCue>()
        .add_systems(OnEnter(GameState::InGame), start_tutorial)
        .add_systems(OnExit(GameState::InGame), stop_tutorial)
        .add_systems(
            Update,
            (forward_tutorial_events, skip_tutorial_step, tick_tutorial, show_tutorial_text)
                .chain()
                .run_if(in_state(GameState::InGame))
                .run_if(resource_exists::<TutorialSequencer>),
        );
}

fn start_tutorial(mut commands: Commands, current: Res<CurrentLevel>, mut text: ResMut<TutorialText>) {
    text.0 = None;
    if current.is_tutorial() {
        info!("Starting tutorial");
        commands.insert_resource(TutorialSequencer::new(default_tutorial(FADE_SECONDS)));
    } else {
        commands.remove_resource::<TutorialSequencer>();
    }
}

fn stop_tutorial(mut commands: Commands, mut text: ResMut<TutorialText>) {
    commands.remove_resource::<TutorialSequencer>();
    text.0 = None;
}

fn from_bow_event(ev: &BowEvent) -> Option<TutorialEvent> {
    match ev {
        BowEvent::ChargeStarted(_) => Some(TutorialEvent::ChargeStarted),
        BowEvent::Fired(_) => Some(TutorialEvent::Fired),
        BowEvent::SelectionChanged(_) => Some(TutorialEvent::SelectionChanged),
        BowEvent::ChargeCancelled(_) => None,
    }
}

fn forward_tutorial_events(
    mut seq: ResMut<TutorialSequencer>,
    mut moved: MessageReader<PlayerMoved>,
    mut jumped: MessageReader<PlayerJumped>,
    mut bow: MessageReader<BowEvent>,
    mut goal: MessageReader<GoalStateChanged>,
) {
    for _ in moved.read() {
        seq.notify(TutorialEvent::Moved);
    }
    for _ in jumped.read() {
        seq.notify(TutorialEvent::Jumped);
    }
    for event in bow.read().filter_map(from_bow_event) {
        seq.notify(event);
    }
    for GoalStateChanged(inside) in goal.read() {
        seq.notify(TutorialEvent::GoalStateChanged(*inside));
    }
}

fn skip_tutorial_step(keys: Option<Res<ButtonInput<KeyCode>>>, mut seq: ResMut<TutorialSequencer>) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Tab) && seq.force_complete() {
        info!("Tutorial step skipped");
    }
}

fn tick_tutorial(time: Res<Time>, mut seq: ResMut<TutorialSequencer>, mut writer: MessageWriter<TutorialCue>) {
    seq.tick(time.delta_secs());
    for cue in seq.drain_cues() {
        writer.write(cue);
    }
}

fn show_tutorial_text(mut reader: MessageReader<TutorialCue>, mut text: ResMut<TutorialText>) {
    for cue in reader.read() {
        text.0 = match cue {
            TutorialCue::Show(s) => Some(s.clone()),
            TutorialCue::Hide => None,
        };
    }
}

#[cfg(test)]
mod tests;
