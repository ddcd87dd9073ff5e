//! Error types for viva.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VivaError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Microphone access denied: {message}")]
    PermissionDenied { message: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Streaming transcription errors
    #[error("Realtime token request failed: {message}")]
    TokenEndpoint { message: String },

    #[error("Streaming session rejected credentials: {message}")]
    AuthRejected { message: String },

    #[error("Streaming connection failed: {message}")]
    ConnectionFailed { message: String },

    // Conversation backend errors
    #[error("Interview backend unavailable: {message}")]
    RelayUnavailable { message: String },

    // Speech playback errors
    #[error("Speech playback failed: {message}")]
    Playback { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VivaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = VivaError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = VivaError::ConfigInvalidValue {
            key: "audio.sample_rate".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for audio.sample_rate: must be positive"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = VivaError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_permission_denied_display() {
        let error = VivaError::PermissionDenied {
            message: "no input device available".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Microphone access denied: no input device available"
        );
    }

    #[test]
    fn test_audio_capture_display() {
        let error = VivaError::AudioCapture {
            message: "stream build failed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio capture failed: stream build failed"
        );
    }

    #[test]
    fn test_token_endpoint_display() {
        let error = VivaError::TokenEndpoint {
            message: "HTTP 500".to_string(),
        };
        assert_eq!(error.to_string(), "Realtime token request failed: HTTP 500");
    }

    #[test]
    fn test_auth_rejected_display() {
        let error = VivaError::AuthRejected {
            message: "token expired".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Streaming session rejected credentials: token expired"
        );
    }

    #[test]
    fn test_connection_failed_display() {
        let error = VivaError::ConnectionFailed {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Streaming connection failed: connection refused"
        );
    }

    #[test]
    fn test_relay_unavailable_display() {
        let error = VivaError::RelayUnavailable {
            message: "HTTP 503".to_string(),
        };
        assert_eq!(error.to_string(), "Interview backend unavailable: HTTP 503");
    }

    #[test]
    fn test_playback_display() {
        let error = VivaError::Playback {
            message: "no output device".to_string(),
        };
        assert_eq!(error.to_string(), "Speech playback failed: no output device");
    }

    #[test]
    fn test_other_display() {
        let error = VivaError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VivaError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: VivaError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);

        fn returns_error() -> Result<i32> {
            Err(VivaError::Other("test error".to_string()))
        }
        assert!(returns_error().is_err());
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: VivaError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VivaError>();
        assert_sync::<VivaError>();
    }

    #[test]
    fn test_error_debug_format() {
        let error = VivaError::ConfigFileNotFound {
            path: "/test/path".to_string(),
        };
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("ConfigFileNotFound"));
        assert!(debug_str.contains("/test/path"));
    }
}
