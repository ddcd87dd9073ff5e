//! The listener: one live AudioCapture + TranscriptionSession pair.
//!
//! The driver owns at most one listener at a time (`Listening` XOR
//! `AiSpeaking` enforces this); the factory seam lets tests drive the
//! session from scripted channels instead of a microphone and a socket.

use crate::audio::frame::AudioFrame;
use crate::audio::pump::{AudioCapture, AudioCaptureConfig, CaptureHandle};
use crate::audio::source::{AudioSource, MockAudioSource};
use crate::error::Result;
use crate::transcribe::session::{SessionHandle, StreamEvent, TranscriptionSession};
use crate::transcribe::token::fetch_realtime_token;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A live capture + transcription pair with its inbound channels.
pub struct Listener {
    pub frames: mpsc::Receiver<AudioFrame>,
    pub events: mpsc::Receiver<StreamEvent>,
    pub session: SessionHandle,
    pub capture: CaptureHandle,
}

impl Listener {
    /// Stop the capture and close the session. Idempotent on both sides.
    pub fn close(&self) {
        self.capture.stop();
        self.session.close();
    }
}

/// Opens listeners on demand (session start and every re-arm after the AI
/// finishes speaking).
#[async_trait]
pub trait ListenerFactory: Send + Sync {
    async fn open(&self) -> Result<Listener>;
}

/// Production factory: fetches a fresh realtime token, connects the
/// streaming socket, and starts the frame pump on a new audio source.
pub struct LiveListenerFactory<F> {
    client: reqwest::Client,
    token_url: String,
    stream_endpoint: String,
    frame_samples: usize,
    make_source: F,
}

impl<F, S> LiveListenerFactory<F>
where
    F: Fn() -> Result<S> + Send + Sync,
    S: AudioSource + 'static,
{
    pub fn new(
        client: reqwest::Client,
        token_url: String,
        stream_endpoint: String,
        frame_samples: usize,
        make_source: F,
    ) -> Self {
        Self {
            client,
            token_url,
            stream_endpoint,
            frame_samples,
            make_source,
        }
    }
}

#[async_trait]
impl<F, S> ListenerFactory for LiveListenerFactory<F>
where
    F: Fn() -> Result<S> + Send + Sync,
    S: AudioSource + 'static,
{
    async fn open(&self) -> Result<Listener> {
        // Each listener gets a fresh short-lived token; a re-arm after a
        // long AI turn must not reuse a stale credential.
        let token = fetch_realtime_token(&self.client, &self.token_url).await?;
        let (session, events) =
            TranscriptionSession::open(&self.stream_endpoint, &token.token).await?;

        let source = (self.make_source)()?;
        let capture = AudioCapture::with_config(
            source,
            AudioCaptureConfig {
                frame_samples: self.frame_samples,
                ..Default::default()
            },
        );
        let (frames, capture_handle) = capture.start()?;

        // Closing the session from either side releases the microphone too.
        let capture_for_close = capture_handle.clone();
        session.set_close_handler(move || capture_for_close.stop());

        Ok(Listener {
            frames,
            events,
            session,
            capture: capture_handle,
        })
    }
}

/// Test factory: silent mock audio, a disconnected session handle, and an
/// event channel the test feeds directly.
pub struct MockListenerFactory {
    /// Scripted events fed into each opened listener, consumed in order.
    scripts: Mutex<Vec<Vec<StreamEvent>>>,
    /// Event senders for every listener opened so far, oldest first.
    senders: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
}

impl MockListenerFactory {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Queue event scripts: the first `open()` plays the first script, the
    /// next open the second, and so on.
    pub fn with_scripts(self, mut scripts: Vec<Vec<StreamEvent>>) -> Self {
        scripts.reverse(); // pop from the back
        if let Ok(mut slot) = self.scripts.lock() {
            *slot = scripts;
        }
        self
    }

    /// Number of listeners opened so far.
    pub fn opened_count(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Sender for injecting events into the most recently opened listener.
    pub fn last_sender(&self) -> Option<mpsc::Sender<StreamEvent>> {
        self.senders
            .lock()
            .ok()
            .and_then(|s| s.last().cloned())
    }
}

impl Default for MockListenerFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListenerFactory for MockListenerFactory {
    async fn open(&self) -> Result<Listener> {
        let (event_tx, events) = mpsc::channel(64);

        let script = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.pop())
            .unwrap_or_default();
        for event in script {
            let _ = event_tx.send(event).await;
        }

        if let Ok(mut senders) = self.senders.lock() {
            senders.push(event_tx);
        }

        // Silent infinite source keeps the frame leg realistic without
        // producing transcript-relevant audio.
        let capture = AudioCapture::with_config(
            MockAudioSource::new().with_samples(vec![0i16; 256]),
            AudioCaptureConfig {
                frame_samples: 256,
                poll_interval_ms: 5,
                ..Default::default()
            },
        );
        let (frames, capture_handle) = capture.start()?;

        Ok(Listener {
            frames,
            events,
            session: SessionHandle::disconnected(),
            capture: capture_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::protocol::TranscriptFragment;

    #[tokio::test]
    async fn test_mock_factory_plays_script_in_order() {
        let factory = MockListenerFactory::new().with_scripts(vec![vec![
            StreamEvent::Fragment(TranscriptFragment {
                text: "one".into(),
                is_final: false,
            }),
            StreamEvent::Fragment(TranscriptFragment {
                text: "one two".into(),
                is_final: true,
            }),
        ]]);

        let mut listener = factory.open().await.unwrap();
        let first = listener.events.recv().await.unwrap();
        assert!(matches!(first, StreamEvent::Fragment(f) if f.text == "one"));
        let second = listener.events.recv().await.unwrap();
        assert!(matches!(second, StreamEvent::Fragment(f) if f.is_final));

        listener.close();
    }

    #[tokio::test]
    async fn test_mock_factory_counts_openings() {
        let factory = MockListenerFactory::new();
        assert_eq!(factory.opened_count(), 0);

        let l1 = factory.open().await.unwrap();
        let l2 = factory.open().await.unwrap();
        assert_eq!(factory.opened_count(), 2);
        assert!(factory.last_sender().is_some());

        l1.close();
        l2.close();
    }

    #[tokio::test]
    async fn test_listener_close_stops_capture() {
        let factory = MockListenerFactory::new();
        let listener = factory.open().await.unwrap();
        assert!(listener.capture.is_running());

        listener.close();
        listener.close(); // idempotent
        assert!(!listener.capture.is_running());
    }

    #[tokio::test]
    async fn test_injected_events_reach_listener() {
        let factory = MockListenerFactory::new();
        let mut listener = factory.open().await.unwrap();

        let sender = factory.last_sender().unwrap();
        sender.send(StreamEvent::Closed).await.unwrap();

        let event = listener.events.recv().await.unwrap();
        assert_eq!(event, StreamEvent::Closed);
        listener.close();
    }
}
