//! Runtime for a chat session
//!
//! One task owns the `ChatState`, feeds renderer intents and generation
//! outcomes through `transition`, and executes the resulting effects.
//! Renderers talk to it through a cloneable `SessionHandle`.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::reply::ReplyGenerator;
use crate::session_store::{SessionStore, VisitorId};
use crate::state_machine::{ChatState, Screen, Snapshot};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

/// Intents a renderer can send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SubmitUserMessage(String),
    SelectQuickReply(String),
    OpenDirectChannel,
    SwitchScreen(Screen),
}

/// Events broadcast to subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State changed; carries the new renderer view
    Snapshot(Snapshot),
    /// A reply generation was handed to the generator
    GenerationStarted { prompt: String },
    /// The in-flight generation settled
    GenerationSettled { failed: bool },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session runtime has stopped")]
    Stopped,
}

/// Immutable facts about the running session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub visitor_id: VisitorId,
    /// Used for the typing indicator label
    pub assistant_name: String,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    visitor_id: VisitorId,
    intent_tx: mpsc::Sender<Intent>,
    events_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    pub async fn submit_user_message(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(Intent::SubmitUserMessage(text.into())).await
    }

    pub async fn select_quick_reply(&self, prompt: impl Into<String>) -> Result<(), SessionError> {
        self.send(Intent::SelectQuickReply(prompt.into())).await
    }

    pub async fn open_direct_channel(&self) -> Result<(), SessionError> {
        self.send(Intent::OpenDirectChannel).await
    }

    pub async fn switch_screen(&self, target: Screen) -> Result<(), SessionError> {
        self.send(Intent::SwitchScreen(target)).await
    }

    pub async fn send(&self, intent: Intent) -> Result<(), SessionError> {
        self.intent_tx
            .send(intent)
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that always holds the latest state
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }
}

/// Rehydrate the visitor's session from `store` and start its runtime in
/// the background. Must be called from within a Tokio runtime.
pub fn start_session<G>(
    store: SessionStore,
    generator: G,
    assistant_name: impl Into<String>,
) -> SessionHandle
where
    G: ReplyGenerator + 'static,
{
    let visitor_id = store.visitor_id();
    let messages = store.load_transcript(&visitor_id);
    let queued = store.load_queue(&visitor_id);
    let has_greeted = store.has_greeted(&visitor_id);
    let identity_known = store.contact_identity(&visitor_id).is_some();

    tracing::info!(
        visitor_id = %visitor_id,
        messages = messages.len(),
        queued = queued.len(),
        has_greeted,
        identity_known,
        "Starting chat session"
    );

    let recovered_queue = !queued.is_empty();
    let state = ChatState::rehydrated(messages, queued, has_greeted, identity_known);
    if recovered_queue {
        // Queued texts now live in the transcript
        store.save_transcript(&visitor_id, &state.messages);
        store.save_queue(&visitor_id, &[]);
    }
    let context = SessionContext {
        visitor_id: visitor_id.clone(),
        assistant_name: assistant_name.into(),
    };

    let (intent_tx, intent_rx) = mpsc::channel(32);
    let (events_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot(&context.assistant_name));

    let runtime = SessionRuntime::new(
        context,
        state,
        store,
        generator,
        intent_rx,
        events_tx.clone(),
        snapshot_tx,
    );

    tokio::spawn(async move {
        runtime.run().await;
    });

    SessionHandle {
        visitor_id,
        intent_tx,
        events_tx,
        snapshot_rx,
    }
}
