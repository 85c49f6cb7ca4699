use super::*;
use std::sync::Mutex;

fn show(text: &str) -> TutorialCue {
    TutorialCue::Show(text.to_string())
}

fn cues(seq: &mut TutorialSequencer) -> Vec<TutorialCue> {
    seq.drain_cues().collect()
}

// ---------------------------------------------------------------------------
// Timed steps and suspensions
// ---------------------------------------------------------------------------

#[test]
fn timed_step_shows_waits_and_hides() {
    let mut seq = TutorialSequencer::new(vec![TutorialStep::timed("aim", 4.0).showing("Aim", 0.5)]);

    seq.tick(0.0);
    assert_eq!(cues(&mut seq), vec![show("Aim")]);
    assert!(seq.is_running());
    assert!(!seq.is_waiting(), "still fading in");

    seq.tick(0.5);
    assert!(seq.is_waiting());

    seq.tick(3.0);
    assert!(seq.is_waiting());
    assert!(cues(&mut seq).is_empty());

    seq.tick(1.0);
    assert_eq!(cues(&mut seq), vec![TutorialCue::Hide]);
    assert!(!seq.is_finished(), "fading out");

    seq.tick(0.5);
    assert!(seq.is_finished());
    assert_eq!(seq.current_index(), None);
}

#[test]
fn leftover_time_carries_into_the_next_step() {
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::timed("first", 1.0),
        TutorialStep::timed("second", 1.0),
    ]);

    seq.tick(2.5);
    assert_eq!(seq.current_index(), Some(1));
    assert!(seq.is_waiting());

    seq.tick(1.0);
    assert!(seq.is_finished());
}

#[test]
fn zero_length_hooks_cost_no_frames() {
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::timed("a", 0.0).showing("A", 0.0),
        TutorialStep::timed("b", 0.0).showing("B", 0.0),
    ]);

    seq.tick(0.0);
    assert!(seq.is_finished());
    assert_eq!(
        cues(&mut seq),
        vec![show("A"), TutorialCue::Hide, show("B"), TutorialCue::Hide]
    );
}

#[test]
fn empty_sequence_is_finished() {
    let mut seq = TutorialSequencer::new(Vec::new());
    assert!(seq.is_empty());
    assert!(seq.is_finished());
    seq.tick(1.0);
    assert!(!seq.force_complete());
}

// ---------------------------------------------------------------------------
// Event steps
// ---------------------------------------------------------------------------

#[test]
fn events_before_listening_are_ignored() {
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::on_event("jump", TutorialEventKind::Jumped).showing("Jump", 0.5),
    ]);
    seq.tick(0.0);

    seq.notify(TutorialEvent::Jumped);
    seq.tick(0.5);
    seq.tick(10.0);
    assert!(seq.is_waiting(), "early event must not count");

    seq.notify(TutorialEvent::Jumped);
    seq.tick(0.0);
    assert!(!seq.is_waiting());
    assert_eq!(cues(&mut seq).last(), Some(&TutorialCue::Hide));
}

#[test]
fn other_event_kinds_do_not_complete() {
    let mut seq = TutorialSequencer::new(vec![TutorialStep::on_event("fire", TutorialEventKind::Fired)]);
    seq.tick(0.0);

    seq.notify(TutorialEvent::ChargeStarted);
    seq.notify(TutorialEvent::Moved);
    seq.tick(1.0);
    assert!(seq.is_waiting());

    seq.notify(TutorialEvent::Fired);
    seq.tick(0.0);
    assert!(seq.is_finished());
}

#[test]
fn min_dwell_holds_a_completed_step() {
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::on_event("move", TutorialEventKind::Moved).with_min_dwell(2.0),
    ]);
    seq.tick(0.0);

    seq.notify(TutorialEvent::Moved);
    seq.tick(1.0);
    assert!(seq.is_waiting());

    seq.tick(1.0);
    assert!(seq.is_finished());
}

#[test]
fn event_hook_sees_the_payload() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::on_event("goal", TutorialEventKind::GoalStateChanged).with_event_hook(Box::new(
            move |event| {
                if let TutorialEvent::GoalStateChanged(inside) = event {
                    sink.lock().unwrap().push(*inside);
                }
            },
        )),
    ]);
    seq.tick(0.0);

    seq.notify(TutorialEvent::GoalStateChanged(true));
    seq.notify(TutorialEvent::GoalStateChanged(false));
    seq.tick(0.0);

    assert!(seq.is_finished());
    assert_eq!(*seen.lock().unwrap(), vec![true], "only the completing event is delivered");
}

// ---------------------------------------------------------------------------
// Delegate steps
// ---------------------------------------------------------------------------

#[test]
fn delegate_step_completes_when_its_signal_is_raised() {
    let handed: Arc<Mutex<Option<CompletionSignal>>> = Arc::default();
    let unsubscribed = Arc::new(AtomicBool::new(false));

    let slot = handed.clone();
    let flag = unsubscribed.clone();
    let mut seq = TutorialSequencer::new(vec![TutorialStep::delegate(
        "custom",
        Box::new(move |signal| *slot.lock().unwrap() = Some(signal.clone())),
        Box::new(move |_| flag.store(true, Ordering::SeqCst)),
    )
    .showing("Custom", 0.25)]);

    seq.tick(0.0);
    assert!(handed.lock().unwrap().is_none(), "subscribed only once listening");

    seq.tick(0.25);
    let signal = handed.lock().unwrap().clone().expect("subscribed");
    seq.tick(5.0);
    assert!(seq.is_waiting());

    signal.raise();
    seq.tick(0.0);
    assert!(unsubscribed.load(Ordering::SeqCst));
    assert!(!seq.is_waiting());
}

// ---------------------------------------------------------------------------
// Force complete
// ---------------------------------------------------------------------------

#[test]
fn force_complete_skips_the_condition_but_not_the_dwell() {
    let mut seq = TutorialSequencer::new(vec![
        TutorialStep::on_event("charge", TutorialEventKind::ChargeStarted).with_min_dwell(2.0),
        TutorialStep::timed("after", 1.0),
    ]);

    assert!(!seq.force_complete(), "nothing running before the first tick");

    seq.tick(0.0);
    assert!(seq.force_complete());
    assert!(!seq.force_complete(), "already completed");

    seq.tick(1.5);
    assert_eq!(seq.current_index(), Some(0));
    seq.tick(0.5);
    assert_eq!(seq.current_index(), Some(1));
}

#[test]
fn force_complete_is_refused_while_ending() {
    let mut seq = TutorialSequencer::new(vec![TutorialStep::timed("t", 0.0).showing("T", 1.0)]);
    seq.tick(1.0);
    assert!(!seq.is_waiting());
    assert!(seq.is_running());
    assert!(!seq.force_complete());
}
