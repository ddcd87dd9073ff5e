//! Audio frame type flowing from the capture pump to the streaming session.

use crate::audio::encode;
use std::time::Instant;

/// Fixed-size chunk of 16-bit PCM audio with tracking metadata.
///
/// Immutable once produced; the capture pump owns it until it is handed to
/// the transport, which serializes it for the wire.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Sequence number for ordering frames.
    pub sequence: u64,
    /// Timestamp when the audio was captured.
    pub timestamp: Instant,
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
}

impl AudioFrame {
    /// Creates a new audio frame stamped with the current time.
    pub fn new(sequence: u64, samples: Vec<i16>) -> Self {
        Self {
            sequence,
            timestamp: Instant::now(),
            samples,
        }
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u32 * 1000) / sample_rate
    }

    /// Serialize the samples into the base64 wire payload.
    pub fn to_base64(&self) -> String {
        encode::pcm16_to_base64(&self.samples)
    }
}
