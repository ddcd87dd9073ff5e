//! Turn-taking: fragment reconciliation and silence-based end-of-turn.
//!
//! The controller is a pure state machine; the debounce timer and the
//! utterance buffer are its two owned pieces of mutable state. All I/O
//! happens in the session driver, which executes the actions the
//! controller returns.

pub mod buffer;
pub mod controller;
pub mod debounce;

pub use buffer::UtteranceBuffer;
pub use controller::{SessionState, TurnAction, TurnController, TurnEvent};
pub use debounce::DebounceTimer;
