//! Audio source trait and mock implementation.

use crate::error::{Result, VivaError};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real microphone, WAV replay,
/// mock). All sources deliver 16-bit PCM at the session sample rate.
pub trait AudioSource: Send + Sync {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read whatever samples have accumulated since the last read.
    ///
    /// An empty vector means no samples are available yet; for finite
    /// sources it means the source is exhausted.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Whether this source ends on its own (WAV replay) rather than running
    /// until stopped (microphone).
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock audio source for testing.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    samples: Vec<i16>,
    finite: bool,
    served: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with default settings.
    pub fn new() -> Self {
        Self {
            is_started: false,
            samples: vec![0i16; 160],
            finite: false,
            served: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to return specific samples on every read.
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self
    }

    /// Configure the mock as a finite source: the samples are served on the
    /// first read, every later read returns empty.
    pub fn with_finite_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self.finite = true;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(VivaError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(VivaError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        if self.finite {
            if self.served {
                return Ok(Vec::new());
            }
            self.served = true;
        }
        Ok(self.samples.clone())
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
