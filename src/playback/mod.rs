//! Speech playback for interviewer prompts.
//!
//! The driver prints the prompt and enters `AiSpeaking` before calling
//! `speak`; success and failure both resolve to the same
//! `PlaybackFinished` event upstream, so a broken output device can never
//! strand the session unable to listen again.

#[cfg(feature = "cpal-audio")]
pub mod http_tts;

#[cfg(feature = "cpal-audio")]
pub use http_tts::HttpTtsPlayback;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Synthesize and play one prompt. Empty text is a no-op.
#[async_trait]
pub trait SpeechPlayback: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Playback backend for sessions without a synthesis endpoint: the prompt
/// is already rendered by the driver, so there is nothing to play.
pub struct TextOnlyPlayback;

#[async_trait]
impl SpeechPlayback for TextOnlyPlayback {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Recording playback double for driver tests.
pub struct MockPlayback {
    spoken: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockPlayback {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            fail: false,
        }
    }

    /// Simulate playback taking this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every `speak` fail with a playback error.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MockPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechPlayback for MockPlayback {
    async fn speak(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(crate::error::VivaError::Playback {
                message: "mock playback failure".to_string(),
            });
        }
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_only_playback_always_succeeds() {
        let playback = TextOnlyPlayback;
        assert!(playback.speak("anything").await.is_ok());
        assert!(playback.speak("").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_records_spoken_texts() {
        let playback = MockPlayback::new();
        playback.speak("first prompt").await.unwrap();
        playback.speak("second prompt").await.unwrap();
        assert_eq!(playback.spoken_texts(), vec!["first prompt", "second prompt"]);
    }

    #[tokio::test]
    async fn test_mock_empty_text_is_no_op() {
        let playback = MockPlayback::new().with_failure();
        // Empty text short-circuits before the scripted failure
        assert!(playback.speak("").await.is_ok());
        assert!(playback.spoken_texts().is_empty());
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let playback = MockPlayback::new().with_failure();
        assert!(playback.speak("prompt").await.is_err());
    }
}
