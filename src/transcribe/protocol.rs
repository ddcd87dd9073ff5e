//! Wire types for the streaming transcription socket.
//!
//! Outbound messages wrap one base64 audio frame; inbound messages carry
//! transcript text in whichever shape the engine version uses. Parsing is
//! deliberately tolerant: unknown fields are ignored and non-transcript
//! messages (session begin/terminate acknowledgments) yield `None`.

use serde::{Deserialize, Serialize};

/// Outbound frame payload: `{ "audio_data": "<base64>" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioMessage {
    pub audio_data: String,
}

impl AudioMessage {
    pub fn new(audio_data: String) -> Self {
        Self { audio_data }
    }
}

/// One piece of transcribed text, interim or final.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

/// Raw inbound message shape, covering both the current engine protocol
/// (`transcript` + `end_of_turn`) and the legacy one (`text` +
/// `message_type`).
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    end_of_turn: Option<bool>,
    #[serde(default)]
    message_type: Option<String>,
}

/// Parse one inbound socket message into a fragment.
///
/// Returns `None` for messages without transcript text (handshakes,
/// acknowledgments) and for unparseable payloads; the session skips them
/// rather than failing the stream.
pub fn parse_fragment(raw: &str) -> Option<TranscriptFragment> {
    let msg: InboundMessage = serde_json::from_str(raw).ok()?;

    let text = msg
        .text
        .or(msg.transcript)
        .filter(|text| !text.is_empty())?;

    let is_final = msg.end_of_turn.unwrap_or_else(|| {
        msg.message_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("FinalTranscript"))
    });

    Some(TranscriptFragment { text, is_final })
}
