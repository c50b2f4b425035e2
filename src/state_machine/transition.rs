//! Pure state transition function

use super::state::{ChatState, Message, PendingTurn, Responder, Screen};
use super::{Effect, Event, GenerationOutcome};
use thiserror::Error;

/// Prompt sent on behalf of a visitor who opens the direct channel for the
/// first time without a stored contact identity
pub const GREETING_PROMPT: &str = "Hello, I'd like to start a conversation.";

/// Assistant text shown in place of a failed generation
pub const FAILURE_TEXT: &str = "Oops! Something went wrong.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Derive effects from what changed between `before` and `after`.
    ///
    /// Every transcript mutation is followed by a persist and every state
    /// change by a publish.
    fn settle(before: &ChatState, after: ChatState, generate: Option<String>) -> Self {
        let transcript_changed = after.messages.len() != before.messages.len();
        let queue_changed = after.queued_texts() != before.queued_texts();
        let greeted_now = after.has_greeted && !before.has_greeted;
        let changed = after != *before;

        let mut result = Self::new(after);
        if transcript_changed {
            result = result.with_effect(Effect::PersistTranscript);
        }
        if queue_changed {
            result = result.with_effect(Effect::PersistQueue);
        }
        if greeted_now {
            result = result.with_effect(Effect::PersistGreeted);
        }
        if changed {
            result = result.with_effect(Effect::PublishSnapshot);
        }
        if let Some(prompt) = generate {
            result = result.with_effect(Effect::generate(prompt));
        }
        result
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Generation settled but no generation was in flight")]
    NoGenerationInFlight,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Invalid renderer input (blank text) yields an unchanged state and no
/// effects rather than an error.
pub fn transition(state: &ChatState, event: Event) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();

    let generate = match event {
        // ============================================================
        // Renderer intents
        // ============================================================
        Event::UserMessage { text } => submit(&mut next, &text),

        Event::QuickReply { prompt } => {
            next.screen = Screen::Active;
            submit(&mut next, &prompt)
        }

        Event::OpenDirectChannel { identity_known } => {
            next.screen = Screen::Active;
            if next.has_greeted {
                None
            } else {
                next.has_greeted = true;
                if identity_known {
                    None
                } else {
                    begin_or_queue(&mut next, PendingTurn::synthetic(GREETING_PROMPT))
                }
            }
        }

        Event::SwitchScreen { target } => {
            next.screen = target;
            None
        }

        // ============================================================
        // Generation settled: append, then drain the queue
        // ============================================================
        Event::GenerationComplete { outcome } => {
            if !next.responder.is_busy() {
                return Err(TransitionError::NoGenerationInFlight);
            }

            let text = match outcome {
                GenerationOutcome::Reply(text) => text,
                GenerationOutcome::Failed(_) => FAILURE_TEXT.to_string(),
            };
            next.messages.push(Message::assistant(text));
            next.responder = Responder::Idle;

            next.pending.pop_front().map(|turn| begin_turn(&mut next, turn))
        }
    };

    Ok(TransitionResult::settle(state, next, generate))
}

// Helper functions

/// Route a visitor text to the responder.
/// Returns the prompt to generate for, if generation starts now.
fn submit(state: &mut ChatState, text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    begin_or_queue(state, PendingTurn::visitor(text))
}

/// Start `turn` when idle, otherwise queue it behind the in-flight one
fn begin_or_queue(state: &mut ChatState, turn: PendingTurn) -> Option<String> {
    if state.responder.is_busy() {
        state.pending.push_back(turn);
        None
    } else {
        Some(begin_turn(state, turn))
    }
}

fn begin_turn(state: &mut ChatState, turn: PendingTurn) -> String {
    if !turn.synthetic {
        state.messages.push(Message::user(turn.prompt.as_str()));
    }
    state.responder = Responder::Generating {
        prompt: turn.prompt.clone(),
    };
    turn.prompt
}
