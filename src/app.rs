//! Interview session entry point.
//!
//! Wires config, the relay client, playback, and the listener factory
//! together and runs one session:
//! capture → transcribe → turn detection → answer → prompt → re-arm

use crate::config::Config;
use crate::error::{Result, VivaError};
use crate::interview::InterviewPlan;
use crate::interview::driver::{InterviewSession, SessionOptions};
use crate::interview::listener::{ListenerFactory, LiveListenerFactory};
use crate::output;
use crate::playback::{SpeechPlayback, TextOnlyPlayback};
use crate::relay::{AnswerRelay, ConversationRelay};
use crate::{defaults, version_string};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(feature = "cpal-audio")]
use crate::audio::capture::{CpalAudioSource, suppress_audio_warnings};
#[cfg(feature = "cpal-audio")]
use crate::playback::HttpTtsPlayback;
use crate::audio::wav::WavAudioSource;

/// Run an interview session: register with the backend, speak the opening
/// prompt, then listen until the candidate stops or the stream drops.
///
/// # Arguments
/// * `config` - Base configuration (can be overridden by CLI args)
/// * `interview` - Path to the interview plan file (required)
/// * `input` - Optional WAV file to replay instead of the microphone
/// * `device` - Optional audio device override from CLI
/// * `server` - Optional backend base URL override from CLI
/// * `silence` - Optional silence window override in milliseconds
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level (0=default, 1=skip reasons, 2=diagnostics)
#[allow(clippy::too_many_arguments)]
pub async fn run_interview_command(
    mut config: Config,
    interview: Option<PathBuf>,
    input: Option<PathBuf>,
    device: Option<String>,
    server: Option<String>,
    silence: Option<u64>,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    #[cfg(feature = "cpal-audio")]
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(d) = device {
        config.audio.device = Some(d);
    }
    if let Some(url) = server {
        config.backend.base_url = url;
    }
    if let Some(ms) = silence {
        config.turn.silence_ms = ms;
    }
    config.validate()?;

    let plan_path = interview.ok_or_else(|| {
        VivaError::Other(
            "An interview plan is required: viva --interview <plan.json>".to_string(),
        )
    })?;
    let plan = InterviewPlan::load(&plan_path)?;
    let ctx = plan.context();

    if !quiet && verbosity >= 2 {
        eprintln!("viva {}", version_string());
        eprintln!("Backend: {}", config.backend.base_url);
        eprintln!("Stream:  {}", config.stream.endpoint);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(defaults::RELAY_TIMEOUT_SECS))
        .build()
        .map_err(|e| VivaError::Other(format!("Failed to build HTTP client: {}", e)))?;

    let relay = Arc::new(ConversationRelay::new(
        client.clone(),
        config.start_url(),
        config.conduct_url(),
    ));
    let playback = make_playback(&config, client.clone());

    // Register the session and deliver the opening prompt before the
    // microphone opens, so the greeting is never transcribed back.
    if !quiet {
        output::print_status("Starting interview session...");
    }
    let greeting = relay.start_session(&plan.session_id, &plan.questions).await?;
    if !greeting.is_empty() {
        output::print_prompt(&greeting);
        if let Err(e) = playback.speak(&greeting).await {
            eprintln!("Playback failed: {}", e);
        }
    }

    let factory = make_factory(&config, client, input)?;
    let options = SessionOptions {
        silence_window: Duration::from_millis(config.turn.silence_ms),
        resume_delay: Duration::from_millis(config.turn.resume_delay_ms),
        quiet,
        verbosity,
    };

    // First Ctrl+C stops the session gracefully (flushing any pending
    // answer); a second one aborts immediately.
    let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(()).await;
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let session = InterviewSession::new(
        ctx,
        relay as Arc<dyn AnswerRelay>,
        playback,
        factory,
        options,
    );
    session.run(stop_rx).await?;

    if !quiet {
        output::print_status("Interview finished.");
    }
    Ok(())
}

/// Select the playback backend: HTTP synthesis when an endpoint is
/// configured, otherwise text only.
fn make_playback(config: &Config, client: reqwest::Client) -> Arc<dyn SpeechPlayback> {
    #[cfg(feature = "cpal-audio")]
    if let Some(endpoint) = &config.tts.endpoint {
        return Arc::new(HttpTtsPlayback::new(
            client,
            endpoint.clone(),
            config.tts.voice.clone(),
        ));
    }
    let _ = (config, client);
    Arc::new(TextOnlyPlayback)
}

/// Build the listener factory for the configured audio source: WAV replay
/// when `--input` is given, otherwise the microphone.
fn make_factory(
    config: &Config,
    client: reqwest::Client,
    input: Option<PathBuf>,
) -> Result<Arc<dyn ListenerFactory>> {
    let token_url = config.token_url();
    let endpoint = config.stream.endpoint.clone();
    let frame_samples = config.audio.frame_samples;

    if let Some(path) = input {
        // Re-opening the listener replays the file from the start.
        let factory = LiveListenerFactory::new(
            client,
            token_url,
            endpoint,
            frame_samples,
            move || WavAudioSource::from_path(&path),
        );
        return Ok(Arc::new(factory));
    }

    #[cfg(feature = "cpal-audio")]
    {
        let device = config.audio.device.clone();
        let factory = LiveListenerFactory::new(
            client,
            token_url,
            endpoint,
            frame_samples,
            move || CpalAudioSource::new(device.as_deref()),
        );
        Ok(Arc::new(factory))
    }

    #[cfg(not(feature = "cpal-audio"))]
    Err(VivaError::AudioDeviceNotFound {
        device: "microphone capture requires the cpal-audio feature; use --input <file.wav>"
            .to_string(),
    })
}
