//! WAV file audio source for replaying recorded sessions.
//!
//! Lets the client run against a file instead of a live microphone, which is
//! how the session loop is exercised without audio hardware.

use crate::audio::source::AudioSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VivaError};
use std::io::Read;
use std::path::Path;

/// Samples handed out per read: 100ms at 16kHz.
const READ_CHUNK: usize = 1600;

/// Audio source that reads from WAV data.
///
/// Supports arbitrary sample rates and channel counts, downmixing and
/// resampling to 16kHz mono.
pub struct WavAudioSource {
    samples: Vec<i16>,
    position: usize,
}

impl WavAudioSource {
    /// Create from a WAV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| VivaError::AudioCapture {
            message: format!("Failed to open WAV file {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(file))
    }

    /// Create from any reader.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| VivaError::AudioCapture {
            message: format!("Failed to parse WAV data: {}", e),
        })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels as usize;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| VivaError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Downmix to mono by averaging channels
        let mono: Vec<i16> = if source_channels <= 1 {
            raw_samples
        } else {
            raw_samples
                .chunks_exact(source_channels)
                .map(|group| {
                    let sum: i32 = group.iter().map(|&s| s as i32).sum();
                    (sum / source_channels as i32) as i16
                })
                .collect()
        };

        let samples = if source_rate == SAMPLE_RATE {
            mono
        } else {
            resample(&mono, source_rate, SAMPLE_RATE)
        };

        Ok(Self {
            samples,
            position: 0,
        })
    }

    /// Total number of 16kHz samples this source will deliver.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the source holds no audio.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = usize::min(self.position + READ_CHUNK, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_16khz_mono_passes_through() {
        let input = vec![100i16, 200, 300, 400, 500];
        let wav = make_wav_data(16000, 1, &input);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav))).unwrap();

        assert_eq!(source.samples, input);
        assert_eq!(source.len(), 5);
    }

    #[test]
    fn test_stereo_downmixes_to_mono() {
        let stereo = vec![100i16, 200, 300, 400, 500, 600];
        let wav = make_wav_data(16000, 2, &stereo);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav))).unwrap();

        assert_eq!(source.samples, vec![150i16, 350, 550]);
    }

    #[test]
    fn test_48khz_resamples_to_16khz() {
        let input = vec![0i16; 48000]; // 1 second at 48kHz
        let wav = make_wav_data(48000, 1, &input);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav))).unwrap();

        assert!(source.len() >= 15900 && source.len() <= 16100);
    }

    #[test]
    fn test_reads_are_chunked_until_exhausted() {
        let input = vec![7i16; READ_CHUNK + 100];
        let wav = make_wav_data(16000, 1, &input);
        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav))).unwrap();

        assert!(source.is_finite());
        assert_eq!(source.read_samples().unwrap().len(), READ_CHUNK);
        assert_eq!(source.read_samples().unwrap().len(), 100);
        assert_eq!(source.read_samples().unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_data_is_rejected() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(vec![1u8, 2, 3])));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let result = WavAudioSource::from_path(Path::new("/nonexistent/audio.wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples = vec![1000i16; 200];
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|&s| s == 1000));
    }
}
