//! Configuration: TOML file, defaults, environment overrides.

use crate::defaults;
use crate::error::{Result, VivaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub stream: StreamConfig,
    pub audio: AudioConfig,
    pub turn: TurnConfig,
    pub tts: TtsConfig,
}

/// Interview backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub token_path: String,
    pub start_path: String,
    pub conduct_path: String,
}

/// Streaming transcription endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub endpoint: String,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_samples: usize,
}

/// Turn-taking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TurnConfig {
    /// Quiet period after the last fragment before the turn is complete.
    pub silence_ms: u64,
    /// Settling delay before re-arming the microphone after playback.
    pub resume_delay_ms: u64,
}

/// Optional text-to-speech endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    pub endpoint: Option<String>,
    pub voice: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BACKEND_BASE_URL.to_string(),
            token_path: defaults::TOKEN_PATH.to_string(),
            start_path: defaults::START_PATH.to_string(),
            conduct_path: defaults::CONDUCT_PATH.to_string(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::STREAM_ENDPOINT.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_samples: defaults::FRAME_SAMPLES,
        }
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            silence_ms: defaults::SILENCE_DEBOUNCE_MS,
            resume_delay_ms: defaults::RESUME_DELAY_MS,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            voice: defaults::TTS_VOICE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file
    /// doesn't exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VivaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VIVA_BACKEND_URL → backend.base_url
    /// - VIVA_STREAM_ENDPOINT → stream.endpoint
    /// - VIVA_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("VIVA_BACKEND_URL")
            && !url.is_empty()
        {
            self.backend.base_url = url;
        }

        if let Ok(endpoint) = std::env::var("VIVA_STREAM_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.stream.endpoint = endpoint;
        }

        if let Ok(device) = std::env::var("VIVA_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(VivaError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.frame_samples == 0 {
            return Err(VivaError::ConfigInvalidValue {
                key: "audio.frame_samples".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.turn.silence_ms == 0 {
            return Err(VivaError::ConfigInvalidValue {
                key: "turn.silence_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.backend.base_url.is_empty() {
            return Err(VivaError::ConfigInvalidValue {
                key: "backend.base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.stream.endpoint.is_empty() {
            return Err(VivaError::ConfigInvalidValue {
                key: "stream.endpoint".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Full URL of the realtime-token endpoint.
    pub fn token_url(&self) -> String {
        join_url(&self.backend.base_url, &self.backend.token_path)
    }

    /// Full URL of the session-start endpoint.
    pub fn start_url(&self) -> String {
        join_url(&self.backend.base_url, &self.backend.start_path)
    }

    /// Full URL of the conversation endpoint.
    pub fn conduct_url(&self) -> String {
        join_url(&self.backend.base_url, &self.backend.conduct_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/viva/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("viva")
            .join("config.toml")
    }

    /// Write the default configuration to `path`, creating parent
    /// directories. Refuses to overwrite an existing file.
    pub fn init_at(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(VivaError::Other(format!(
                "Config already exists at {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&Config::default())
            .map_err(|e| VivaError::Other(format!("Failed to render default config: {}", e)))?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
