//! HTTP text-to-speech playback via rodio.

use crate::error::{Result, VivaError};
use crate::playback::SpeechPlayback;
use async_trait::async_trait;
use serde::Serialize;
use std::io::Cursor;

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Posts prompt text to a synthesis endpoint and plays the returned audio
/// (WAV or MP3) on the default output device, blocking until the sink
/// drains so the completion signal matches the end of audible speech.
pub struct HttpTtsPlayback {
    client: reqwest::Client,
    endpoint: String,
    voice: String,
}

impl HttpTtsPlayback {
    pub fn new(client: reqwest::Client, endpoint: String, voice: String) -> Self {
        Self {
            client,
            endpoint,
            voice,
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesisRequest {
                text,
                voice: &self.voice,
            })
            .send()
            .await
            .map_err(|e| VivaError::Playback {
                message: format!("synthesis request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(VivaError::Playback {
                message: format!("synthesis endpoint returned HTTP {}", response.status().as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| VivaError::Playback {
            message: format!("failed to read synthesis audio: {}", e),
        })?;

        Ok(bytes.to_vec())
    }

    fn play_blocking(audio: Vec<u8>) -> Result<()> {
        let stream = rodio::OutputStreamBuilder::open_default_stream().map_err(|e| {
            VivaError::Playback {
                message: format!("no audio output device: {}", e),
            }
        })?;
        let sink = rodio::Sink::connect_new(stream.mixer());

        let source = rodio::Decoder::new(Cursor::new(audio)).map_err(|e| VivaError::Playback {
            message: format!("undecodable synthesis audio: {}", e),
        })?;

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[async_trait]
impl SpeechPlayback for HttpTtsPlayback {
    async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let audio = self.synthesize(text).await?;

        // rodio playback is blocking; keep it off the event loop
        tokio::task::spawn_blocking(move || Self::play_blocking(audio))
            .await
            .map_err(|e| VivaError::Playback {
                message: format!("playback task panicked: {}", e),
            })?
    }
}
