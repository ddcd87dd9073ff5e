//! Duplex streaming session: audio frames out, transcript fragments in.
//!
//! One WebSocket connection per session. A reader task turns inbound
//! messages into [`StreamEvent`]s on a channel; a writer task drains the
//! outbound frame queue. Neither reconnects: a dropped stream surfaces as
//! an event and the session is over.

use crate::audio::frame::AudioFrame;
use crate::defaults;
use crate::error::{Result, VivaError};
use crate::transcribe::protocol::{self, AudioMessage, TranscriptFragment};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Inbound events surfaced by the reader task.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One transcript fragment, interim or final.
    Fragment(TranscriptFragment),
    /// Transport-level error; the stream is done after this.
    Error(String),
    /// The connection closed (remote close or transport end).
    Closed,
}

type CloseHandler = Box<dyn FnOnce() + Send>;

/// Handle to an open streaming session.
///
/// Cheap to clone; all clones share the closed flag, so `close()` on any
/// of them is idempotent across the set.
#[derive(Clone)]
pub struct SessionHandle {
    outbound: mpsc::Sender<Message>,
    closed: Arc<AtomicBool>,
    close_handler: Arc<Mutex<Option<CloseHandler>>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Opens streaming transcription sessions.
pub struct TranscriptionSession;

/// Build the connection URL: `{endpoint}?sample_rate=16000&token={token}`.
///
/// A bare-authority endpoint (no path) gets a `/` appended first; without
/// it the handshake request line carries an invalid origin-form target.
fn stream_url(endpoint: &str, token: &str) -> String {
    let mut base = endpoint.trim_end_matches('?').to_string();
    let after_scheme = base.find("://").map(|i| i + 3).unwrap_or(0);
    if !base[after_scheme..].contains('/') {
        base.push('/');
    }
    format!(
        "{}?sample_rate={}&token={}",
        base,
        defaults::SAMPLE_RATE,
        token
    )
}

impl TranscriptionSession {
    /// Connect to the streaming endpoint with a realtime token.
    ///
    /// The URL carries the session sample rate and the credential:
    /// `{endpoint}?sample_rate=16000&token={token}`. Returns the handle for
    /// sending frames plus the receiver for inbound events.
    pub async fn open(
        endpoint: &str,
        token: &str,
    ) -> Result<(SessionHandle, mpsc::Receiver<StreamEvent>)> {
        let url = stream_url(endpoint, token);

        let (stream, _response) = connect_async(&url).await.map_err(|e| match e {
            // An HTTP rejection during the upgrade means the credential was
            // refused; anything else is transport failure.
            WsError::Http(response) if response.status().is_client_error() => {
                VivaError::AuthRejected {
                    message: format!("HTTP {}", response.status().as_u16()),
                }
            }
            other => VivaError::ConnectionFailed {
                message: other.to_string(),
            },
        })?;

        let (mut write, mut read) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(64);
        let (event_tx, event_rx) = mpsc::channel::<StreamEvent>(256);
        let closed = Arc::new(AtomicBool::new(false));

        // Writer: drain the outbound queue until the handle closes it.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let is_close = matches!(message, Message::Close(_));
                if write.send(message).await.is_err() {
                    break;
                }
                if is_close {
                    break;
                }
            }
        });

        // Reader: translate inbound messages into events.
        let reader_closed = closed.clone();
        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Text(raw)) => {
                        if let Some(fragment) = protocol::parse_fragment(raw.as_str())
                            && event_tx
                                .send(StreamEvent::Fragment(fragment))
                                .await
                                .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // ping/pong/binary: nothing to surface
                    Err(e) => {
                        let _ = event_tx.send(StreamEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            let _ = event_tx.send(StreamEvent::Closed).await;
        });

        let handle = SessionHandle {
            outbound: outbound_tx,
            closed,
            close_handler: Arc::new(Mutex::new(None)),
        };

        Ok((handle, event_rx))
    }
}

impl SessionHandle {
    /// Returns a handle with no socket behind it; every send is dropped.
    ///
    /// Used where a listener is wired from channels directly (tests, replay
    /// harnesses) and there is no live connection to manage.
    pub fn disconnected() -> Self {
        let (outbound, _discard) = mpsc::channel(1);
        Self {
            outbound,
            closed: Arc::new(AtomicBool::new(true)),
            close_handler: Arc::new(Mutex::new(None)),
        }
    }

    /// Register cleanup to run once when the session closes.
    ///
    /// The driver uses this to stop the paired audio capture with the
    /// session, so a close from either side releases the microphone.
    pub fn set_close_handler(&self, handler: impl FnOnce() + Send + 'static) {
        if let Ok(mut slot) = self.close_handler.lock() {
            *slot = Some(Box::new(handler));
        }
    }

    /// Transmit one audio frame as a JSON-wrapped base64 payload.
    ///
    /// Silently dropped when the session is closed or the outbound queue is
    /// full. Callers gate sends on session state; a lost frame only costs
    /// a fraction of a second of audio.
    pub fn send_frame(&self, frame: &AudioFrame) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let message = AudioMessage::new(frame.to_base64());
        if let Ok(json) = serde_json::to_string(&message) {
            let _ = self.outbound.try_send(Message::Text(json.into()));
        }
    }

    /// True until the session closes from either side.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Close the session gracefully. Idempotent.
    ///
    /// Queues a WebSocket Close frame and runs the registered close
    /// handler. A second call finds the closed flag already set and does
    /// nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.outbound.try_send(Message::Close(None));
        let handler = self.close_handler.lock().ok().and_then(|mut h| h.take());
        if let Some(handler) = handler {
            handler();
        }
    }
}
