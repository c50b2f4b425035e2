//! Chat session state types

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// Transcript
// ============================================================================

/// Who produced a message. Serialized with the widget's historical
/// `"user"` / `"bot"` tags so stored transcripts stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Assistant,
}

/// A single transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub origin: Origin,
    pub text: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
            feedback: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            text: text.into(),
            feedback: None,
        }
    }
}

/// A turn waiting for the responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub prompt: String,
    /// Synthetic turns (the greeting) never show a visitor message
    pub synthetic: bool,
}

impl PendingTurn {
    pub fn visitor(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            synthetic: false,
        }
    }

    pub fn synthetic(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            synthetic: true,
        }
    }
}

// ============================================================================
// Screen and Responder
// ============================================================================

/// Which widget screen the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Help menu with quick replies
    #[default]
    Landing,
    /// Conversation transcript and composer
    Active,
}

/// Single-responder status. At most one generation exists at a time,
/// so the in-flight prompt lives inside the variant rather than beside it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Responder {
    #[default]
    Idle,
    Generating {
        /// Prompt the in-flight generation is answering
        prompt: String,
    },
}

impl Responder {
    pub fn is_busy(&self) -> bool {
        matches!(self, Responder::Generating { .. })
    }
}

// ============================================================================
// Chat State
// ============================================================================

/// The aggregate the engine owns. Only `transition` produces new values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatState {
    pub screen: Screen,
    pub messages: Vec<Message>,
    /// Turns submitted while busy, started strictly in order. A visitor
    /// turn joins `messages` when it starts, keeping the transcript in
    /// question/answer order.
    pub pending: VecDeque<PendingTurn>,
    pub responder: Responder,
    pub has_greeted: bool,
}

impl ChatState {
    /// State for a session that starts with a stored transcript and flags.
    /// Queue and responder always start empty: generations do not survive
    /// a reload. Texts that were still queued join the transcript
    /// unanswered, after the stored messages.
    pub fn rehydrated(
        mut messages: Vec<Message>,
        queued: Vec<String>,
        has_greeted: bool,
        identity_known: bool,
    ) -> Self {
        messages.extend(queued.into_iter().map(Message::user));
        Self {
            screen: if identity_known {
                Screen::Active
            } else {
                Screen::Landing
            },
            messages,
            pending: VecDeque::new(),
            responder: Responder::Idle,
            has_greeted,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.responder.is_busy()
    }

    /// Renderer-facing view of this state
    pub fn snapshot(&self, assistant_name: &str) -> Snapshot {
        Snapshot {
            screen: self.screen,
            messages: self.messages.clone(),
            busy: self.is_busy(),
            typing: self
                .is_busy()
                .then(|| format!("{assistant_name} is typing...")),
            queued: self.queued_texts(),
        }
    }

    /// Visitor texts waiting for their turn, oldest first. Synthetic
    /// turns are left out.
    pub fn queued_texts(&self) -> Vec<String> {
        self.pending
            .iter()
            .filter(|turn| !turn.synthetic)
            .map(|turn| turn.prompt.clone())
            .collect()
    }
}

/// What the renderer observes after every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub screen: Screen,
    pub messages: Vec<Message>,
    pub busy: bool,
    /// Typing indicator label, present while a reply is being composed
    pub typing: Option<String>,
    /// Visitor texts waiting for their turn, oldest first
    pub queued: Vec<String>,
}
