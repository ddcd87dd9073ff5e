//! Command-line interface for viva
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voice-driven interview sessions from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "viva",
    version,
    about = "Voice-driven interview sessions from the terminal"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: skip reasons + timings, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Interview plan file (session id, candidate identity, question list)
    #[arg(long, value_name = "PLAN")]
    pub interview: Option<PathBuf>,

    /// Replay a WAV file instead of capturing from the microphone
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Audio input device (e.g., pipewire, hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Interview backend base URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Silence window before a turn completes (default: 2s). Examples: 2s, 1500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_silence_ms)]
    pub silence: Option<u64>,
}

/// Parse a silence duration string into milliseconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (milliseconds), single-unit (`2s`, `1500ms`), and compound (`1m30s`).
fn parse_silence_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}
