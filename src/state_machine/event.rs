//! Events that can occur in a chat session

use super::state::Screen;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Renderer intents
    UserMessage {
        text: String,
    },
    QuickReply {
        prompt: String,
    },
    OpenDirectChannel {
        /// Whether a contact identity is stored for this visitor. Read from
        /// the session store by the runtime before dispatch.
        identity_known: bool,
    },
    SwitchScreen {
        target: Screen,
    },

    // Reply generator events
    GenerationComplete {
        outcome: GenerationOutcome,
    },
}

/// How a reply generation settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Reply(String),
    Failed(String),
}
