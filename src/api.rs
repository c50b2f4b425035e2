//! HTTP API for the chat widget
//!
//! A browser renderer drives the single process-wide session through these
//! routes and watches it over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::LandingMenu;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub menu: Arc<LandingMenu>,
}

impl AppState {
    pub fn new(session: SessionHandle, menu: LandingMenu) -> Self {
        Self {
            session,
            menu: Arc::new(menu),
        }
    }
}
