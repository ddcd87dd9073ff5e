//! Microphone capture and wire encoding.
//!
//! ```text
//! ┌──────────────┐    ┌────────────┐    ┌─────────────────┐
//! │ AudioSource  │───▶│ AudioCapture│───▶│ AudioFrame (PCM)│───▶ base64 on send
//! │ (cpal / WAV) │    │ (frame pump)│    │  via mpsc       │
//! └──────────────┘    └────────────┘    └─────────────────┘
//! ```
//!
//! Sources produce raw 16-bit PCM at 16kHz mono; the pump slices the stream
//! into fixed-size frames. Encoding to the wire form (little-endian bytes,
//! chunked base64) lives in [`encode`] as pure functions.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod encode;
pub mod frame;
pub mod pump;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::{CpalAudioSource, list_devices, suppress_audio_warnings};
pub use frame::AudioFrame;
pub use pump::{AudioCapture, AudioCaptureConfig, CaptureHandle};
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavAudioSource;
