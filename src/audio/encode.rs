//! Pure PCM and base64 encoding for the audio wire format.
//!
//! The streaming recognizer accepts 16-bit little-endian PCM wrapped in
//! base64. Conversion and encoding are kept as plain functions with no I/O
//! so they can be tested against the round-trip tolerance on their own.

use crate::defaults::ENCODE_CHUNK_BYTES;
use crate::error::{Result, VivaError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Convert float samples in [-1, 1] to signed 16-bit PCM.
///
/// Out-of-range input is clamped before scaling by 0x7fff, so a hot signal
/// saturates instead of wrapping.
pub fn pcm16_from_f32(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 0x7fff as f32) as i16)
        .collect()
}

/// Convert signed 16-bit PCM back to float samples in [-1, 1].
pub fn f32_from_pcm16(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 0x7fff as f32).collect()
}

/// Encode PCM samples as the base64 payload sent on the socket.
///
/// Samples are packed little-endian, then encoded in chunks of
/// [`ENCODE_CHUNK_BYTES`] so intermediate strings stay bounded on very large
/// buffers. The chunk size is a multiple of 3, which keeps every chunk
/// padding-free except the last; the concatenation is therefore a single
/// valid base64 string.
pub fn pcm16_to_base64(samples: &[i16]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    let mut encoded = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(ENCODE_CHUNK_BYTES) {
        STANDARD.encode_string(chunk, &mut encoded);
    }
    encoded
}

/// Decode a base64 payload back into PCM samples.
pub fn pcm16_from_base64(payload: &str) -> Result<Vec<i16>> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| VivaError::Other(format!("Invalid base64 audio payload: {}", e)))?;

    if bytes.len() % 2 != 0 {
        return Err(VivaError::Other(format!(
            "Audio payload has odd byte length: {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
