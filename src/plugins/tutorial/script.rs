//! The tutorial level's step list.

use super::sequencer::{TutorialEventKind, TutorialStep};

/// Seconds each text takes to fade in or out.
pub const FADE_SECONDS: f32 = 0.5;

const READ_SECONDS: f32 = 4.0;
const DWELL_SECONDS: f32 = 2.0;

pub fn default_tutorial(fade: f32) -> Vec<TutorialStep> {
    use TutorialEventKind as K;

    let act = |name: &str, kind: K, text: &str| {
        TutorialStep::on_event(name, kind).with_min_dwell(DWELL_SECONDS).showing(text, fade)
    };
    let read = |name: &str, text: &str| TutorialStep::timed(name, READ_SECONDS).showing(text, fade);

    vec![
        act("move", K::Moved, "Use WASD to move"),
        act("jump", K::Jumped, "Use the space bar to jump"),
        act("charge", K::ChargeStarted, "Hold right click to charge up an arrow"),
        read("aim", "Use the mouse to aim the arrow"),
        act("fire", K::Fired, "While holding right click, press left click to fire"),
        read("sticky", "Arrows will stick to wooden surfaces"),
        act("select", K::SelectionChanged, "Use the scroll wheel to change arrows"),
        read("bounce", "The bouncy arrow will bounce things on top of it upwards"),
        read("rebound", "The rebound arrow will bounce off of non-wood surfaces"),
        read("chain", "The chain arrow will create a chain between two embedded arrows"),
        act("goal", K::GoalStateChanged, "Use the Arrows and your body to get the ball to the goal"),
    ]
}
