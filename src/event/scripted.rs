//! Scripted event
//!
//! Advances through an ordered action list. Actions may carry labels and
//! jump to them, so scripts are not strictly linear; the event terminates
//! when it runs past the end or the current action reports it cannot finish.

use crate::content::element::ContentElement;
use crate::event::EventContext;
use tracing::warn;

/// Cap on zero-cost actions processed in one tick, so label cycles without
/// waits cannot stall the simulation
const MAX_STEPS_PER_TICK: usize = 64;

/// What one action reported for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionState {
    Running,
    Done,
    /// The action can never complete (e.g. a jump to a missing label)
    CannotFinish,
}

#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Hold the script for a duration
    Wait { seconds: f32 },
    /// Emit a message to the session layer
    Message { text: String },
    /// Jump to the action carrying the target label
    GoTo { target: String },
}

#[derive(Debug, Clone)]
pub struct ScriptedAction {
    pub label: Option<String>,
    pub kind: ActionKind,
}

impl ScriptedAction {
    /// Parse one `action` element; unknown kinds are content errors
    pub fn from_element(element: &ContentElement) -> Option<ScriptedAction> {
        let label = element.attr_ident("label");
        let kind = match element.attr_ident("kind").as_deref() {
            Some("wait") => ActionKind::Wait {
                seconds: element.attr_f32("seconds", 1.0).max(0.0),
            },
            Some("message") => ActionKind::Message {
                text: element.attr_str("text", ""),
            },
            Some("goto") => ActionKind::GoTo {
                target: element.attr_ident("target").unwrap_or_default(),
            },
            other => {
                warn!(kind = ?other, "unknown scripted action kind, skipped");
                return None;
            }
        };
        Some(ScriptedAction { label, kind })
    }
}

#[derive(Debug)]
pub struct ScriptedEvent {
    actions: Vec<ScriptedAction>,
    current: usize,
    /// Remaining time of the wait action in progress
    wait_timer: Option<f32>,
}

impl ScriptedEvent {
    pub fn new(actions: Vec<ScriptedAction>) -> ScriptedEvent {
        ScriptedEvent {
            actions,
            current: 0,
            wait_timer: None,
        }
    }

    /// Returns true once the script has run to completion. Wait actions
    /// consume tick time, so several short actions may complete in one tick.
    pub fn update(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        let mut remaining = delta_time;
        for _ in 0..MAX_STEPS_PER_TICK {
            if self.current >= self.actions.len() {
                return true;
            }
            match self.step(&mut remaining, ctx) {
                ActionState::Running => return false,
                ActionState::CannotFinish => return true,
                ActionState::Done => {}
            }
        }
        false
    }

    fn step(&mut self, remaining: &mut f32, ctx: &mut EventContext<'_>) -> ActionState {
        let kind = self.actions[self.current].kind.clone();
        match kind {
            ActionKind::Wait { seconds } => {
                let timer = self.wait_timer.get_or_insert(seconds);
                if *timer > *remaining {
                    *timer -= *remaining;
                    *remaining = 0.0;
                    return ActionState::Running;
                }
                *remaining -= *timer;
                self.wait_timer = None;
                self.current += 1;
                ActionState::Done
            }
            ActionKind::Message { text } => {
                ctx.outbox.messages.push(text);
                self.current += 1;
                ActionState::Done
            }
            ActionKind::GoTo { target } => {
                match self
                    .actions
                    .iter()
                    .position(|action| action.label.as_deref() == Some(target.as_str()))
                {
                    Some(index) => {
                        self.current = index;
                        ActionState::Done
                    }
                    None => {
                        warn!(target = %target, "scripted jump target not found, terminating");
                        ActionState::CannotFinish
                    }
                }
            }
        }
    }
}
