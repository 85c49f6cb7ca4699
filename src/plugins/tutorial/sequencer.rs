//! Tutorial step runner.
//!
//! One step at a time, strictly in order. Each step walks
//!
//! ```text
//!   Pending ──on_start hook──► Starting(suspend) ──subscribe──► Waiting
//!                                                                 │ completion satisfied
//!                                                                 │ AND elapsed >= min_dwell
//!                                                                 ▼
//!   next step ◄── Ending(suspend) ◄──on_end hook── unsubscribe ───┘
//! ```
//!
//! Suspensions are plain countdowns drained by `tick(dt)`; leftover `dt`
//! carries into the next phase, so zero-length suspensions cost no frames.
//! Events only count while the step is `Waiting` (i.e. after it started
//! listening).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::prelude::*;

/// Gameplay happenings a step can wait for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TutorialEvent {
    Moved,
    Jumped,
    ChargeStarted,
    Fired,
    SelectionChanged,
    GoalStateChanged(bool),
}

impl TutorialEvent {
    pub fn kind(self) -> TutorialEventKind {
        match self {
            Self::Moved => TutorialEventKind::Moved,
            Self::Jumped => TutorialEventKind::Jumped,
            Self::ChargeStarted => TutorialEventKind::ChargeStarted,
            Self::Fired => TutorialEventKind::Fired,
            Self::SelectionChanged => TutorialEventKind::SelectionChanged,
            Self::GoalStateChanged(_) => TutorialEventKind::GoalStateChanged,
        }
    }
}

/// `TutorialEvent` without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TutorialEventKind {
    Moved,
    Jumped,
    ChargeStarted,
    Fired,
    SelectionChanged,
    GoalStateChanged,
}

/// Text instructions for whatever displays the tutorial.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub enum TutorialCue {
    Show(String),
    Hide,
}

/// Raised by whoever a delegate step handed it to.
#[derive(Clone, Debug, Default)]
pub struct CompletionSignal(Arc<AtomicBool>);

impl CompletionSignal {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Start/end side effect. Returns how long to suspend, in seconds.
pub type StepHook = Box<dyn FnMut(&mut Vec<TutorialCue>) -> f32 + Send + Sync>;
pub type SignalHook = Box<dyn FnMut(&CompletionSignal) + Send + Sync>;
pub type EventHook = Box<dyn FnMut(&TutorialEvent) + Send + Sync>;

pub enum Completion {
    /// Hand a fresh signal to `subscribe` when listening starts; done once it is raised.
    Delegate { subscribe: SignalHook, unsubscribe: SignalHook },
    /// Done after this many seconds of waiting.
    Time(f32),
    /// Done on the first event of `kind`; `on_event` sees its payload first.
    Event { kind: TutorialEventKind, on_event: Option<EventHook> },
}

pub struct TutorialStep {
    pub name: String,
    completion: Completion,
    on_start: Option<StepHook>,
    on_end: Option<StepHook>,
    min_dwell: f32,
}

impl TutorialStep {
    fn new(name: impl Into<String>, completion: Completion) -> Self {
        Self { name: name.into(), completion, on_start: None, on_end: None, min_dwell: 0.0 }
    }

    pub fn delegate(name: impl Into<String>, subscribe: SignalHook, unsubscribe: SignalHook) -> Self {
        Self::new(name, Completion::Delegate { subscribe, unsubscribe })
    }

    pub fn timed(name: impl Into<String>, duration: f32) -> Self {
        Self::new(name, Completion::Time(duration))
    }

    pub fn on_event(name: impl Into<String>, kind: TutorialEventKind) -> Self {
        Self::new(name, Completion::Event { kind, on_event: None })
    }

    /// Callback for the completing event's payload. Only meaningful on event steps.
    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        if let Completion::Event { on_event, .. } = &mut self.completion {
            *on_event = Some(hook);
        }
        self
    }

    pub fn with_start(mut self, hook: StepHook) -> Self {
        self.on_start = Some(hook);
        self
    }

    pub fn with_end(mut self, hook: StepHook) -> Self {
        self.on_end = Some(hook);
        self
    }

    pub fn with_min_dwell(mut self, seconds: f32) -> Self {
        self.min_dwell = seconds;
        self
    }

    /// Show `text` on start and hide it on end, each suspending for `fade`.
    pub fn showing(self, text: impl Into<String>, fade: f32) -> Self {
        let text = text.into();
        self.with_start(Box::new(move |cues| {
            cues.push(TutorialCue::Show(text.clone()));
            fade
        }))
        .with_end(Box::new(move |cues| {
            cues.push(TutorialCue::Hide);
            fade
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Pending,
    Starting { remaining: f32 },
    Waiting { elapsed: f32 },
    Ending { remaining: f32 },
    Finished,
}

#[derive(Resource)]
pub struct TutorialSequencer {
    steps: Vec<TutorialStep>,
    current: usize,
    phase: Phase,
    completed: bool,
    signal: CompletionSignal,
    cues: Vec<TutorialCue>,
}

impl TutorialSequencer {
    pub fn new(steps: Vec<TutorialStep>) -> Self {
        let phase = if steps.is_empty() { Phase::Finished } else { Phase::Pending };
        Self {
            steps,
            current: 0,
            phase,
            completed: false,
            signal: CompletionSignal::default(),
            cues: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the step being run, `None` once finished.
    pub fn current_index(&self) -> Option<usize> {
        (self.phase != Phase::Finished).then_some(self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The current step is between its start hook and the end of its end hook.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Starting { .. } | Phase::Waiting { .. } | Phase::Ending { .. })
    }

    /// The current step is listening for its completion.
    pub fn is_waiting(&self) -> bool {
        matches!(self.phase, Phase::Waiting { .. })
    }

    /// Cues emitted by hooks since the last drain.
    pub fn drain_cues(&mut self) -> std::vec::Drain<'_, TutorialCue> {
        self.cues.drain(..)
    }

    /// Mark the running step complete without its own condition. The minimum
    /// dwell still applies. No-op when nothing is running or it is already done.
    pub fn force_complete(&mut self) -> bool {
        if !self.is_running() || self.completed || matches!(self.phase, Phase::Ending { .. }) {
            return false;
        }
        self.completed = true;
        true
    }

    /// Deliver an event to the waiting step.
    pub fn notify(&mut self, event: TutorialEvent) {
        if !self.is_waiting() || self.completed {
            return;
        }
        let Some(step) = self.steps.get_mut(self.current) else {
            return;
        };
        if let Completion::Event { kind, on_event } = &mut step.completion {
            if *kind == event.kind() {
                if let Some(hook) = on_event {
                    hook(&event);
                }
                self.completed = true;
            }
        }
    }

    pub fn tick(&mut self, dt: f32) {
        let mut budget = dt.max(0.0);

        loop {
            match self.phase {
                Phase::Finished => return,

                Phase::Pending => {
                    self.completed = false;
                    self.signal = CompletionSignal::default();
                    let step = &mut self.steps[self.current];
                    info!("Tutorial step {} started: {}", self.current, step.name);
                    let suspend = step.on_start.as_mut().map_or(0.0, |hook| hook(&mut self.cues));
                    self.phase = Phase::Starting { remaining: suspend };
                }

                Phase::Starting { remaining } => {
                    if remaining > budget {
                        self.phase = Phase::Starting { remaining: remaining - budget };
                        return;
                    }
                    budget -= remaining;
                    if let Completion::Delegate { subscribe, .. } = &mut self.steps[self.current].completion {
                        subscribe(&self.signal);
                    }
                    self.phase = Phase::Waiting { elapsed: 0.0 };
                }

                Phase::Waiting { elapsed } => {
                    let elapsed = elapsed + budget;
                    budget = 0.0;
                    self.phase = Phase::Waiting { elapsed };
                    if !self.is_satisfied(elapsed) {
                        return;
                    }

                    let step = &mut self.steps[self.current];
                    if let Completion::Delegate { unsubscribe, .. } = &mut step.completion {
                        unsubscribe(&self.signal);
                    }
                    let suspend = step.on_end.as_mut().map_or(0.0, |hook| hook(&mut self.cues));
                    self.phase = Phase::Ending { remaining: suspend };
                }

                Phase::Ending { remaining } => {
                    if remaining > budget {
                        self.phase = Phase::Ending { remaining: remaining - budget };
                        return;
                    }
                    budget -= remaining;
                    info!("Tutorial step {} ended: {}", self.current, self.steps[self.current].name);
                    self.current += 1;
                    self.phase = if self.current < self.steps.len() { Phase::Pending } else { Phase::Finished };
                }
            }
        }
    }

    fn is_satisfied(&self, elapsed: f32) -> bool {
        let step = &self.steps[self.current];
        if elapsed < step.min_dwell {
            return false;
        }
        self.completed
            || match step.completion {
                Completion::Delegate { .. } => self.signal.is_raised(),
                Completion::Time(duration) => elapsed >= duration,
                Completion::Event { .. } => false,
            }
    }
}

#[cfg(test)]
mod tests;
