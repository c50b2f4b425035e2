//! Reply generator abstraction
//!
//! The engine's only asynchronous collaborator. Anything that can turn a
//! prompt into reply text, eventually, can stand behind this trait.

mod canned;
mod error;

pub use canned::{CannedReplies, ReplyDelay, DEFAULT_REPLY};
pub use error::{ReplyError, ReplyErrorKind};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for reply backends
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Produce a reply for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ReplyError>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ReplyGenerator + ?Sized> ReplyGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, ReplyError> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for reply generators
pub struct LoggingGenerator<G> {
    inner: G,
}

impl<G: ReplyGenerator> LoggingGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: ReplyGenerator> ReplyGenerator for LoggingGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, ReplyError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    generator = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    prompt_len = prompt.len(),
                    reply_len = reply.len(),
                    "Reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    generator = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Reply generation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
