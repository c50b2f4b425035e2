//! Effects produced by state transitions

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the full transcript to the session store
    PersistTranscript,

    /// Write the visitor texts still waiting for their turn
    PersistQueue,

    /// Record that the greeting has been sent for this visitor
    PersistGreeted,

    /// Start a reply generation (spawns as background task)
    Generate { prompt: String },

    /// Publish a fresh snapshot to subscribed renderers
    PublishSnapshot,
}

impl Effect {
    pub fn generate(prompt: impl Into<String>) -> Self {
        Effect::Generate {
            prompt: prompt.into(),
        }
    }
}
