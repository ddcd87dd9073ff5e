//! Streaming speech recognition over a duplex WebSocket.
//!
//! ```text
//! token endpoint ──▶ RealtimeToken ──▶ TranscriptionSession::open
//!                                          │
//!                   AudioFrame ──send──▶ socket ──▶ StreamEvent (fragments)
//! ```

pub mod protocol;
pub mod session;
pub mod token;

pub use protocol::{AudioMessage, TranscriptFragment};
pub use session::{SessionHandle, StreamEvent, TranscriptionSession};
pub use token::{RealtimeToken, fetch_realtime_token};
