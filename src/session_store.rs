//! Tab-scoped session persistence
//!
//! A best-effort key/value side channel. The engine writes its transcript
//! here after every mutation and reads it once at startup; nothing in a
//! running session depends on a write succeeding.

mod memory;
mod sqlite;

pub use memory::{MemoryMedium, UnavailableMedium};
pub use sqlite::SqliteMedium;

use crate::state_machine::Message;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Global key holding the visitor identifier
pub const VISITOR_ID_KEY: &str = "user_id";

const VISITOR_ID_PREFIX: &str = "user_";
const VISITOR_ID_LEN: usize = 8;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Error, Debug)]
pub enum MediumError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Storage unavailable")]
    Unavailable,
    #[error("Storage lock poisoned")]
    Poisoned,
}

// ============================================================================
// Storage Medium
// ============================================================================

/// Raw string key/value surface backing a session
pub trait StorageMedium: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError>;

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError>;
}

impl<T: StorageMedium + ?Sized> StorageMedium for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        (**self).set(key, value)
    }
}

// ============================================================================
// Visitor and Identity
// ============================================================================

/// Opaque per-tab visitor identifier, e.g. `user_k3j9x0qa`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..VISITOR_ID_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();
        Self(format!("{VISITOR_ID_PREFIX}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact details a host page may have stored for the visitor.
/// Only its presence matters to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactIdentity {
    pub name: String,
    pub email: String,
}

// ============================================================================
// Session Store
// ============================================================================

/// Total, best-effort store over a `StorageMedium`.
///
/// Medium failures are logged and swallowed: reads degrade to "absent",
/// writes to no-ops.
#[derive(Clone)]
pub struct SessionStore {
    medium: Arc<dyn StorageMedium>,
}

impl SessionStore {
    pub fn new(medium: impl StorageMedium + 'static) -> Self {
        Self {
            medium: Arc::new(medium),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.medium.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Session store read failed");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.medium.set(key, value) {
            tracing::warn!(key = %key, error = %e, "Session store write failed");
        }
    }

    // ==================== Typed Keys ====================

    /// The stored visitor id, creating and storing one on first access
    pub fn visitor_id(&self) -> VisitorId {
        if let Some(existing) = self.get(VISITOR_ID_KEY).filter(|id| !id.is_empty()) {
            return VisitorId::new(existing);
        }
        let visitor = VisitorId::generate();
        self.set(VISITOR_ID_KEY, visitor.as_str());
        tracing::info!(visitor_id = %visitor, "Generated visitor id");
        visitor
    }

    /// Stored transcript for `visitor`. Absent or unparsable history
    /// yields an empty log.
    pub fn load_transcript(&self, visitor: &VisitorId) -> Vec<Message> {
        let Some(raw) = self.get(&transcript_key(visitor)) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(visitor_id = %visitor, error = %e, "Discarding malformed transcript");
                Vec::new()
            }
        }
    }

    pub fn save_transcript(&self, visitor: &VisitorId, messages: &[Message]) {
        match serde_json::to_string(messages) {
            Ok(json) => self.set(&transcript_key(visitor), &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize transcript"),
        }
    }

    /// Visitor texts that were waiting for a reply when last saved.
    /// Absent or unparsable entries yield nothing.
    pub fn load_queue(&self, visitor: &VisitorId) -> Vec<String> {
        let Some(raw) = self.get(&queue_key(visitor)) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(queued) => queued,
            Err(e) => {
                tracing::warn!(visitor_id = %visitor, error = %e, "Discarding malformed queue");
                Vec::new()
            }
        }
    }

    pub fn save_queue(&self, visitor: &VisitorId, queued: &[String]) {
        match serde_json::to_string(queued) {
            Ok(json) => self.set(&queue_key(visitor), &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize queue"),
        }
    }

    /// Stored contact identity; both fields must be present and non-empty
    pub fn contact_identity(&self, visitor: &VisitorId) -> Option<ContactIdentity> {
        let name = self.get(&name_key(visitor)).filter(|v| !v.is_empty())?;
        let email = self.get(&email_key(visitor)).filter(|v| !v.is_empty())?;
        Some(ContactIdentity { name, email })
    }

    pub fn set_contact_identity(&self, visitor: &VisitorId, identity: &ContactIdentity) {
        self.set(&name_key(visitor), &identity.name);
        self.set(&email_key(visitor), &identity.email);
    }

    pub fn has_greeted(&self, visitor: &VisitorId) -> bool {
        self.get(&greeted_key(visitor)).as_deref() == Some("true")
    }

    pub fn mark_greeted(&self, visitor: &VisitorId) {
        self.set(&greeted_key(visitor), "true");
    }
}

fn transcript_key(visitor: &VisitorId) -> String {
    format!("chat_messages_{visitor}")
}

fn queue_key(visitor: &VisitorId) -> String {
    format!("chat_pending_{visitor}")
}

fn name_key(visitor: &VisitorId) -> String {
    format!("chat_name_{visitor}")
}

fn email_key(visitor: &VisitorId) -> String {
    format!("chat_email_{visitor}")
}

fn greeted_key(visitor: &VisitorId) -> String {
    format!("first_message_sent_{visitor}")
}
