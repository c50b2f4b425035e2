//! Core chat session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! intents and generation outcomes go in, a new state plus a list of
//! effects comes out. The runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, GenerationOutcome};
pub use state::{ChatState, Message, Origin, PendingTurn, Responder, Screen, Snapshot};
pub use transition::{transition, TransitionError, TransitionResult};
