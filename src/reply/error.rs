//! Reply generator error types

use thiserror::Error;

/// Reply generation error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ReplyError {
    pub kind: ReplyErrorKind,
    pub message: String,
}

impl ReplyError {
    pub fn new(kind: ReplyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Unavailable, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Backend, message)
    }
}

/// Error classification, for logs only. The engine treats every kind the
/// same way and never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyErrorKind {
    /// Backend not configured or unreachable
    Unavailable,
    /// Backend answered with an error
    Backend,
}
