//! Default configuration constants for viva.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default number of samples per emitted audio frame.
///
/// At 16kHz this is 128ms of audio per frame, small enough for the streaming
/// recognizer to produce timely interim fragments while keeping the message
/// rate on the socket modest.
pub const FRAME_SAMPLES: usize = 2048;

/// Default silence debounce window in milliseconds.
///
/// The turn is considered complete after this much quiet time since the last
/// transcript fragment. 2000ms tolerates natural mid-answer pauses without
/// cutting the speaker off.
pub const SILENCE_DEBOUNCE_MS: u64 = 2000;

/// Delay in milliseconds before re-arming the microphone after playback ends.
///
/// Gives the output device time to drain so the tail of the spoken prompt is
/// not picked up as user speech.
pub const RESUME_DELAY_MS: u64 = 500;

/// Byte chunk size for base64-encoding audio frames.
///
/// Close to 32KB, but held to a multiple of 3 so each chunk encodes without
/// padding and the concatenated chunks form one valid base64 string.
pub const ENCODE_CHUNK_BYTES: usize = 32_766;

/// Default streaming transcription endpoint.
pub const STREAM_ENDPOINT: &str = "wss://streaming.assemblyai.com/v3/ws";

/// Default interview backend base URL.
pub const BACKEND_BASE_URL: &str = "http://localhost:5000";

/// Default path of the realtime-token endpoint, relative to the backend base.
pub const TOKEN_PATH: &str = "/api/realtime-token";

/// Default path of the session-start endpoint, relative to the backend base.
pub const START_PATH: &str = "/api/ConductInterview/start";

/// Default path of the conversation endpoint, relative to the backend base.
pub const CONDUCT_PATH: &str = "/api/ConductInterview/conduct";

/// Lifetime requested for realtime streaming tokens, in seconds.
pub const TOKEN_TTL_SECS: u64 = 300;

/// Client-level timeout for interview backend calls, in seconds.
///
/// The backend consults an LLM per answer, which can take a while; an
/// unbounded request would hold the send-in-progress guard forever.
pub const RELAY_TIMEOUT_SECS: u64 = 30;

/// Default synthesized voice name sent to the TTS endpoint.
pub const TTS_VOICE: &str = "default";
