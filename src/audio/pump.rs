//! Background pump from an audio source into fixed-size frames.
//!
//! Wraps an audio source and provides:
//! - Continuous capture in a dedicated thread
//! - Fixed frame sizes suitable for a streaming recognizer
//! - Sequence numbering for tracking
//! - A handle to stop capture from async code

use crate::audio::frame::AudioFrame;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for the capture pump.
#[derive(Debug, Clone)]
pub struct AudioCaptureConfig {
    /// Samples per emitted frame.
    pub frame_samples: usize,
    /// Channel buffer size (number of frames to buffer).
    pub channel_buffer_size: usize,
    /// Polling interval when no samples available (ms).
    pub poll_interval_ms: u64,
}

impl Default for AudioCaptureConfig {
    fn default() -> Self {
        Self {
            frame_samples: defaults::FRAME_SAMPLES,
            channel_buffer_size: 256,
            poll_interval_ms: 10,
        }
    }
}

/// Pump that continuously reads an audio source and emits frames.
pub struct AudioCapture<A: AudioSource> {
    audio_source: A,
    config: AudioCaptureConfig,
    sequence: AtomicU64,
    running: Arc<AtomicBool>,
}

impl<A: AudioSource + 'static> AudioCapture<A> {
    /// Creates a pump wrapping the given audio source.
    pub fn new(audio_source: A) -> Self {
        Self::with_config(audio_source, AudioCaptureConfig::default())
    }

    /// Creates a pump with custom configuration.
    pub fn with_config(audio_source: A, config: AudioCaptureConfig) -> Self {
        Self {
            audio_source,
            config,
            sequence: AtomicU64::new(0),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts capture in a background thread.
    ///
    /// Returns a receiver for audio frames. Capture runs until `stop()` is
    /// called on the handle, the receiver is dropped, or a finite source is
    /// exhausted. A finite source's trailing partial frame is flushed before
    /// the channel closes.
    pub fn start(mut self) -> Result<(mpsc::Receiver<AudioFrame>, CaptureHandle)> {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let running = self.running.clone();

        self.audio_source.start()?;
        running.store(true, Ordering::SeqCst);

        let frame_samples = self.config.frame_samples;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let finite = self.audio_source.is_finite();
        let handle = CaptureHandle {
            running: running.clone(),
        };

        thread::spawn(move || {
            let mut pending: Vec<i16> = Vec::with_capacity(frame_samples * 2);

            'capture: while running.load(Ordering::SeqCst) {
                match self.audio_source.read_samples() {
                    Ok(samples) if !samples.is_empty() => {
                        pending.extend_from_slice(&samples);

                        while pending.len() >= frame_samples {
                            let rest = pending.split_off(frame_samples);
                            let chunk = std::mem::replace(&mut pending, rest);
                            let seq = self.sequence.fetch_add(1, Ordering::SeqCst);

                            // Stop if receiver dropped
                            if tx.blocking_send(AudioFrame::new(seq, chunk)).is_err() {
                                break 'capture;
                            }
                        }
                    }
                    Ok(_) if finite => {
                        // Source exhausted, flush the remainder
                        if !pending.is_empty() {
                            let chunk = std::mem::take(&mut pending);
                            let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                            let _ = tx.blocking_send(AudioFrame::new(seq, chunk));
                        }
                        break;
                    }
                    Ok(_) => {
                        // No samples yet, wait briefly
                        thread::sleep(poll_interval);
                    }
                    Err(e) => {
                        eprintln!("Audio capture error: {}", e);
                        break;
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            let _ = self.audio_source.stop();
        });

        Ok((rx, handle))
    }
}

/// Handle to control a running capture pump.
#[derive(Clone)]
pub struct CaptureHandle {
    running: Arc<AtomicBool>,
}

impl CaptureHandle {
    /// Stops the capture. Safe to call more than once.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns true if the capture thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
