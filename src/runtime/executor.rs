//! Session runtime executor

use super::{Intent, SessionContext, SessionEvent};
use crate::reply::ReplyGenerator;
use crate::session_store::SessionStore;
use crate::state_machine::{transition, ChatState, Effect, Event, GenerationOutcome, Snapshot};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Generic session runtime that works with any reply generator
pub struct SessionRuntime<G>
where
    G: ReplyGenerator + 'static,
{
    context: SessionContext,
    state: ChatState,
    store: SessionStore,
    generator: Arc<G>,
    intent_rx: mpsc::Receiver<Intent>,
    /// Spawned generations report back here
    settled_tx: mpsc::Sender<GenerationOutcome>,
    settled_rx: mpsc::Receiver<GenerationOutcome>,
    events_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl<G> SessionRuntime<G>
where
    G: ReplyGenerator + 'static,
{
    pub fn new(
        context: SessionContext,
        state: ChatState,
        store: SessionStore,
        generator: G,
        intent_rx: mpsc::Receiver<Intent>,
        events_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<Snapshot>,
    ) -> Self {
        let (settled_tx, settled_rx) = mpsc::channel(8);
        Self {
            context,
            state,
            store,
            generator: Arc::new(generator),
            intent_rx,
            settled_tx,
            settled_rx,
            events_tx,
            snapshot_tx,
        }
    }

    /// Process intents and generation outcomes until every handle is gone
    /// and nothing is in flight
    pub async fn run(mut self) {
        tracing::info!(visitor_id = %self.context.visitor_id, "Session runtime started");

        let mut intents_open = true;
        loop {
            tokio::select! {
                Some(outcome) = self.settled_rx.recv() => {
                    let _ = self.events_tx.send(SessionEvent::GenerationSettled {
                        failed: matches!(outcome, GenerationOutcome::Failed(_)),
                    });
                    self.process_event(Event::GenerationComplete { outcome });
                }
                intent = self.intent_rx.recv(), if intents_open => {
                    match intent {
                        Some(intent) => self.process_intent(intent),
                        None => intents_open = false,
                    }
                }
            }

            if !intents_open && !self.state.is_busy() {
                break;
            }
        }

        tracing::info!(visitor_id = %self.context.visitor_id, "Session runtime stopped");
    }

    fn process_intent(&mut self, intent: Intent) {
        tracing::debug!(intent = ?intent, "Handling intent");

        let event = match intent {
            Intent::SubmitUserMessage(text) => Event::UserMessage { text },
            Intent::SelectQuickReply(prompt) => Event::QuickReply { prompt },
            Intent::OpenDirectChannel => Event::OpenDirectChannel {
                identity_known: self
                    .store
                    .contact_identity(&self.context.visitor_id)
                    .is_some(),
            },
            Intent::SwitchScreen(target) => Event::SwitchScreen { target },
        };
        self.process_event(event);
    }

    fn process_event(&mut self, event: Event) {
        // Pure state transition
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring event");
                return;
            }
        };

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PersistTranscript => {
                self.store
                    .save_transcript(&self.context.visitor_id, &self.state.messages);
            }

            Effect::PersistQueue => {
                self.store
                    .save_queue(&self.context.visitor_id, &self.state.queued_texts());
            }

            Effect::PersistGreeted => {
                self.store.mark_greeted(&self.context.visitor_id);
            }

            Effect::PublishSnapshot => {
                let snapshot = self.state.snapshot(&self.context.assistant_name);
                self.snapshot_tx.send_replace(snapshot.clone());
                let _ = self.events_tx.send(SessionEvent::Snapshot(snapshot));
            }

            Effect::Generate { prompt } => {
                tracing::info!(
                    prompt_len = prompt.len(),
                    pending = self.state.pending.len(),
                    "Starting reply generation"
                );
                let _ = self.events_tx.send(SessionEvent::GenerationStarted {
                    prompt: prompt.clone(),
                });

                let generator = self.generator.clone();
                let settled_tx = self.settled_tx.clone();

                tokio::spawn(async move {
                    // Inner task so a panicking generator still settles
                    let generation =
                        tokio::spawn(async move { generator.generate(&prompt).await });

                    let outcome = match generation.await {
                        Ok(Ok(reply)) => GenerationOutcome::Reply(reply),
                        Ok(Err(e)) => GenerationOutcome::Failed(e.to_string()),
                        Err(e) => {
                            tracing::error!(error = %e, "Reply generation task aborted");
                            GenerationOutcome::Failed(e.to_string())
                        }
                    };
                    let _ = settled_tx.send(outcome).await;
                });
            }
        }
    }
}
