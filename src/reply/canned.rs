//! Canned reply stub
//!
//! Stands in for a real assistant backend: waits a random delay within a
//! configured range, then answers with one of a fixed set of texts.

use super::{ReplyError, ReplyGenerator};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REPLY: &str = "Thank you for your message! This is a demo response. Our team will get back to you shortly with more information about our renovation services.";

/// Latency window for canned replies, parsed from `"2000"` or `"1000-3000"`
/// (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelay {
    pub min: Duration,
    pub max: Duration,
}

impl ReplyDelay {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(2000))
    }
}

impl FromStr for ReplyDelay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| format!("invalid delay {part:?}: {e}"))
        };

        match s.split_once('-') {
            Some((min, max)) => {
                let (min, max) = (parse(min)?, parse(max)?);
                if max < min {
                    return Err(format!("delay range {s:?} ends before it starts"));
                }
                Ok(Self { min, max })
            }
            None => parse(s).map(Self::fixed),
        }
    }
}

/// Demo reply generator
pub struct CannedReplies {
    replies: Vec<String>,
    delay: ReplyDelay,
}

impl CannedReplies {
    pub fn new(replies: Vec<String>, delay: ReplyDelay) -> Self {
        Self { replies, delay }
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self::new(vec![DEFAULT_REPLY.to_string()], ReplyDelay::default())
    }
}

#[async_trait]
impl ReplyGenerator for CannedReplies {
    async fn generate(&self, _prompt: &str) -> Result<String, ReplyError> {
        tokio::time::sleep(self.delay.sample()).await;
        self.replies
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| ReplyError::unavailable("No canned replies configured"))
    }

    fn name(&self) -> &str {
        "canned"
    }
}
