//! Chat widget session controller
//!
//! Drives the conversation behind an embeddable support chat: an ordered
//! transcript, a single responder answering queued visitor messages in
//! order, and a best-effort session store that survives page reloads.

pub mod api;
pub mod config;
pub mod reply;
pub mod runtime;
pub mod session_store;
pub mod state_machine;

pub use config::WidgetConfig;
pub use runtime::{start_session, SessionError, SessionHandle};
