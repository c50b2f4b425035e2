//! API request and response types

use crate::state_machine::Screen;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

/// Request to pick a help-menu entry
#[derive(Debug, Deserialize)]
pub struct QuickReplyRequest {
    pub prompt: String,
}

/// Request to change the visible screen
#[derive(Debug, Deserialize)]
pub struct SwitchScreenRequest {
    pub screen: Screen,
}

/// Response for intent actions
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    /// False when the intent is a no-op, e.g. blank text
    pub accepted: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
