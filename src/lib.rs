//! viva - Voice-driven interview sessions from the terminal
//!
//! Streams microphone audio to a realtime transcription service, detects
//! when the candidate has finished a turn, relays the answer to the
//! interview backend, and plays the interviewer's next prompt.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod interview;
pub mod output;
pub mod playback;
pub mod relay;
pub mod transcribe;
pub mod turn;

// Core traits (capture → transcribe → relay → speak)
pub use audio::source::AudioSource;
pub use interview::listener::ListenerFactory;
pub use playback::SpeechPlayback;
pub use relay::AnswerRelay;

// Error handling
pub use error::{Result, VivaError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
