//! Mock implementations for testing
//!
//! These mocks enable integration testing of the session runtime without
//! real latency or storage.

use super::{start_session, SessionHandle};
use crate::reply::{ReplyError, ReplyGenerator};
use crate::session_store::{MemoryMedium, SessionStore};
use crate::state_machine::Snapshot;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock Reply Generator
// ============================================================================

/// Mock generator that returns queued outcomes, falling back to
/// `"reply to {prompt}"` once the queue is empty
pub struct MockReplyGenerator {
    outcomes: Mutex<VecDeque<Result<String, ReplyError>>>,
    delay: Duration,
    /// When set, each generation waits for one permit
    gate: Option<Arc<Semaphore>>,
    /// Record of all prompts received
    pub prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Notified whenever a generation starts
    pub started: Arc<Notify>,
}

impl MockReplyGenerator {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            gate: None,
            prompts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Hold every generation until the test releases it
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held generations finish
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_error(&self, error: ReplyError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Highest number of generations ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockReplyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyGenerator for MockReplyGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ReplyError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply to {prompt}")));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Generator whose task always panics
pub struct PanickingGenerator;

#[async_trait]
impl ReplyGenerator for PanickingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ReplyError> {
        panic!("generator blew up");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

// ============================================================================
// Test Session Builder
// ============================================================================

/// Helper for building test sessions with minimal boilerplate
pub struct TestSession {
    pub handle: SessionHandle,
    pub store: SessionStore,
    pub medium: Arc<MemoryMedium>,
    pub generator: Arc<MockReplyGenerator>,
}

impl TestSession {
    pub fn builder() -> TestSessionBuilder {
        TestSessionBuilder::default()
    }

    /// Wait until the published snapshot satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&Snapshot) -> bool) -> Snapshot {
        let mut rx = self.handle.watch();
        let result = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate)).await;
        match result {
            Ok(Ok(snapshot)) => snapshot.clone(),
            _ => panic!(
                "Timed out waiting for snapshot, last was {:?}",
                self.handle.snapshot()
            ),
        }
    }

    /// Wait until nothing is generating or queued
    pub async fn wait_idle(&self) -> Snapshot {
        self.wait_for(|s| !s.busy && s.queued.is_empty()).await
    }
}

#[derive(Default)]
pub struct TestSessionBuilder {
    generator: Option<MockReplyGenerator>,
    medium: Option<MemoryMedium>,
    assistant_name: Option<String>,
}

impl TestSessionBuilder {
    pub fn generator(mut self, generator: MockReplyGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Start from previously stored entries, as after a reload
    pub fn medium(mut self, medium: MemoryMedium) -> Self {
        self.medium = Some(medium);
        self
    }

    pub fn assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = Some(name.into());
        self
    }

    pub fn build(self) -> TestSession {
        let medium = Arc::new(self.medium.unwrap_or_default());
        let store = SessionStore::new(medium.clone());
        let generator = Arc::new(self.generator.unwrap_or_default());

        let handle = start_session(
            store.clone(),
            generator.clone(),
            self.assistant_name.unwrap_or_else(|| "Adam".to_string()),
        );

        TestSession {
            handle,
            store,
            medium,
            generator,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SessionEvent;
    use crate::session_store::VISITOR_ID_KEY;
    use crate::state_machine::transition::{FAILURE_TEXT, GREETING_PROMPT};
    use crate::state_machine::{Message, Screen};

    #[tokio::test]
    async fn test_mock_reply_generator() {
        let mock = MockReplyGenerator::new();
        mock.queue_reply("queued");

        assert_eq!(mock.generate("a").await.unwrap(), "queued");
        assert_eq!(mock.generate("b").await.unwrap(), "reply to b");
        assert_eq!(mock.recorded_prompts(), vec!["a", "b"]);
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_simple_reply() {
        let session = TestSession::builder().build();

        session.handle.submit_user_message("Hi").await.unwrap();
        let snapshot = session.wait_for(|s| s.messages.len() == 2 && !s.busy).await;

        assert_eq!(
            snapshot.messages,
            vec![Message::user("Hi"), Message::assistant("reply to Hi")]
        );
        assert_eq!(snapshot.typing, None);
    }

    #[tokio::test]
    async fn test_typing_indicator_while_generating() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().gated())
            .assistant_name("Eve")
            .build();

        session.handle.submit_user_message("Hi").await.unwrap();
        let snapshot = session.wait_for(|s| s.busy).await;
        assert_eq!(snapshot.typing.as_deref(), Some("Eve is typing..."));

        session.generator.release(1);
        let snapshot = session.wait_idle().await;
        assert_eq!(snapshot.typing, None);
    }

    /// B is sent before A's reply arrives; the transcript must still read
    /// A, reply to A, B, reply to B with one generation at a time.
    #[tokio::test]
    async fn test_second_message_waits_for_first() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().gated())
            .build();

        session.handle.submit_user_message("A").await.unwrap();
        session.handle.submit_user_message("B").await.unwrap();

        let snapshot = session.wait_for(|s| s.queued == ["B"]).await;
        assert!(snapshot.busy);
        assert_eq!(snapshot.messages, vec![Message::user("A")]);

        session.generator.release(1);
        let snapshot = session.wait_for(|s| s.messages.len() == 3).await;
        assert_eq!(
            snapshot.messages,
            vec![
                Message::user("A"),
                Message::assistant("reply to A"),
                Message::user("B"),
            ]
        );
        assert!(snapshot.busy);
        assert!(snapshot.queued.is_empty());

        session.generator.release(1);
        let snapshot = session.wait_idle().await;
        assert_eq!(
            snapshot.messages,
            vec![
                Message::user("A"),
                Message::assistant("reply to A"),
                Message::user("B"),
                Message::assistant("reply to B"),
            ]
        );
        assert_eq!(session.generator.recorded_prompts(), vec!["A", "B"]);
        assert_eq!(session.generator.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_burst_of_messages_is_answered_in_order() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().with_delay(Duration::from_millis(5)))
            .build();

        for text in ["one", "two", "three", "four"] {
            session.handle.submit_user_message(text).await.unwrap();
        }
        let snapshot = session.wait_for(|s| s.messages.len() == 8 && !s.busy).await;

        let texts: Vec<_> = snapshot.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "one",
                "reply to one",
                "two",
                "reply to two",
                "three",
                "reply to three",
                "four",
                "reply to four",
            ]
        );
        assert_eq!(session.generator.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_rendered_and_queue_continues() {
        let generator = MockReplyGenerator::new().with_delay(Duration::from_millis(5));
        generator.queue_error(ReplyError::backend("boom"));
        let session = TestSession::builder().generator(generator).build();

        session.handle.submit_user_message("C").await.unwrap();
        session.handle.submit_user_message("D").await.unwrap();
        let snapshot = session.wait_for(|s| s.messages.len() == 4 && !s.busy).await;

        assert_eq!(
            snapshot.messages,
            vec![
                Message::user("C"),
                Message::assistant(FAILURE_TEXT),
                Message::user("D"),
                Message::assistant("reply to D"),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_generator_settles_as_failure() {
        let store = SessionStore::new(MemoryMedium::new());
        let handle = start_session(store, PanickingGenerator, "Adam");
        let mut rx = handle.watch();

        handle.submit_user_message("Hi").await.unwrap();
        let settled = tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.messages.len() == 2 && !s.busy),
        )
        .await
        .expect("generation should settle")
        .unwrap()
        .clone();

        assert_eq!(settled.messages[1], Message::assistant(FAILURE_TEXT));
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let session = TestSession::builder().build();

        session.handle.submit_user_message("   ").await.unwrap();
        session.handle.submit_user_message("hello").await.unwrap();
        let snapshot = session.wait_for(|s| s.messages.len() == 2 && !s.busy).await;

        assert_eq!(snapshot.messages[0], Message::user("hello"));
        assert_eq!(session.generator.recorded_prompts(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_quick_reply_opens_conversation() {
        let session = TestSession::builder().build();
        assert_eq!(session.handle.snapshot().screen, Screen::Landing);

        session
            .handle
            .select_quick_reply("Do you handle permits and inspections?")
            .await
            .unwrap();
        let snapshot = session.wait_for(|s| s.messages.len() == 2 && !s.busy).await;

        assert_eq!(snapshot.screen, Screen::Active);
        assert_eq!(
            snapshot.messages[0],
            Message::user("Do you handle permits and inspections?")
        );
    }

    #[tokio::test]
    async fn test_direct_channel_greets_once() {
        let session = TestSession::builder().build();

        session.handle.open_direct_channel().await.unwrap();
        session.wait_for(|s| s.messages.len() == 1 && !s.busy).await;
        session.handle.switch_screen(Screen::Landing).await.unwrap();
        session.handle.open_direct_channel().await.unwrap();
        let snapshot = session
            .wait_for(|s| s.screen == Screen::Active && !s.busy)
            .await;

        assert_eq!(
            snapshot.messages,
            vec![Message::assistant(format!("reply to {GREETING_PROMPT}"))]
        );
        assert_eq!(session.generator.recorded_prompts(), vec![GREETING_PROMPT]);
        assert!(session.store.has_greeted(session.handle.visitor_id()));
    }

    #[tokio::test]
    async fn test_known_identity_skips_greeting() {
        let medium = MemoryMedium::with_entries([
            (VISITOR_ID_KEY, "user_known01"),
            ("chat_name_user_known01", "Ada"),
            ("chat_email_user_known01", "ada@example.com"),
        ]);
        let session = TestSession::builder().medium(medium).build();
        assert_eq!(session.handle.snapshot().screen, Screen::Active);
        let mut events = session.handle.subscribe();

        session.handle.open_direct_channel().await.unwrap();
        let snapshot = loop {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("snapshot expected")
                .unwrap();
            if let SessionEvent::Snapshot(snapshot) = event {
                break snapshot;
            }
        };

        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.busy);
        assert!(session.generator.recorded_prompts().is_empty());
        assert!(session.store.has_greeted(session.handle.visitor_id()));
    }

    #[tokio::test]
    async fn test_rehydrates_previous_transcript() {
        let medium = MemoryMedium::with_entries([
            (VISITOR_ID_KEY, "user_reload01"),
            (
                "chat_messages_user_reload01",
                r#"[{"type":"user","text":"Hi"},{"type":"bot","text":"Hello!"}]"#,
            ),
            ("first_message_sent_user_reload01", "true"),
        ]);
        let session = TestSession::builder().medium(medium).build();

        let snapshot = session.handle.snapshot();
        assert_eq!(session.handle.visitor_id().as_str(), "user_reload01");
        assert_eq!(
            snapshot.messages,
            vec![Message::user("Hi"), Message::assistant("Hello!")]
        );
        assert_eq!(snapshot.screen, Screen::Landing);
        assert!(!snapshot.busy);

        // Already greeted, so opening the channel stays quiet
        session.handle.open_direct_channel().await.unwrap();
        let snapshot = session.wait_for(|s| s.screen == Screen::Active).await;
        assert_eq!(snapshot.messages.len(), 2);
        assert!(session.generator.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_queued_text_survives_reload() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().gated())
            .build();

        session.handle.submit_user_message("A").await.unwrap();
        session.handle.submit_user_message("B").await.unwrap();
        session.wait_for(|s| s.queued == ["B"]).await;
        assert_eq!(
            session.store.load_queue(session.handle.visitor_id()),
            vec!["B"]
        );

        // Reload: a fresh runtime over the same storage
        let reloaded = start_session(
            SessionStore::new(session.medium.clone()),
            MockReplyGenerator::new(),
            "Adam",
        );
        let snapshot = reloaded.snapshot();

        assert_eq!(reloaded.visitor_id(), session.handle.visitor_id());
        assert_eq!(
            snapshot.messages,
            vec![Message::user("A"), Message::user("B")]
        );
        assert!(snapshot.queued.is_empty());
        assert!(!snapshot.busy);
        assert!(session.store.load_queue(reloaded.visitor_id()).is_empty());
        assert_eq!(
            session.store.load_transcript(reloaded.visitor_id()),
            snapshot.messages
        );
    }

    #[tokio::test]
    async fn test_dequeued_text_leaves_stored_queue() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().gated())
            .build();

        session.handle.submit_user_message("A").await.unwrap();
        session.handle.submit_user_message("B").await.unwrap();
        session.wait_for(|s| s.queued == ["B"]).await;

        session.generator.release(1);
        session.wait_for(|s| s.messages.len() == 3).await;
        assert!(session
            .store
            .load_queue(session.handle.visitor_id())
            .is_empty());

        session.generator.release(1);
        session.wait_idle().await;
    }

    #[tokio::test]
    async fn test_malformed_transcript_starts_empty() {
        let medium = MemoryMedium::with_entries([
            (VISITOR_ID_KEY, "user_broken1"),
            ("chat_messages_user_broken1", "{not json"),
        ]);
        let session = TestSession::builder().medium(medium).build();

        assert!(session.handle.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_persisted_transcript_matches_state() {
        let session = TestSession::builder().build();

        session.handle.submit_user_message("Hi").await.unwrap();
        let snapshot = session.wait_for(|s| s.messages.len() == 2 && !s.busy).await;

        let stored = session.store.load_transcript(session.handle.visitor_id());
        assert_eq!(stored, snapshot.messages);
    }

    #[tokio::test]
    async fn test_screen_switch_while_generating() {
        let session = TestSession::builder()
            .generator(MockReplyGenerator::new().gated())
            .build();

        session.handle.submit_user_message("A").await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), session.generator.started.notified())
            .await
            .expect("generation should start");

        // The runtime keeps taking intents while the reply is held
        session.handle.switch_screen(Screen::Landing).await.unwrap();
        let snapshot = session.wait_for(|s| s.screen == Screen::Landing).await;
        assert!(snapshot.busy);
        assert_eq!(snapshot.messages, vec![Message::user("A")]);

        session.generator.release(1);
        let snapshot = session.wait_idle().await;
        assert_eq!(snapshot.screen, Screen::Landing);
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_generation_events_are_broadcast() {
        let session = TestSession::builder().build();
        let mut events = session.handle.subscribe();

        session.handle.submit_user_message("Hi").await.unwrap();

        let mut started = None;
        let mut settled = None;
        while settled.is_none() {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("event expected")
                .unwrap();
            match event {
                SessionEvent::GenerationStarted { prompt } => started = Some(prompt),
                SessionEvent::GenerationSettled { failed } => settled = Some(failed),
                SessionEvent::Snapshot(_) => {}
            }
        }

        assert_eq!(started.as_deref(), Some("Hi"));
        assert_eq!(settled, Some(false));
    }
}
