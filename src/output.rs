//! Terminal rendering for the interview session.
//!
//! Everything goes to stderr so a piped stdout stays clean. The live
//! transcript is re-rendered in place with `\r`; prompts and answers are
//! printed as durable lines.

use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Transcript lines longer than this are shown tail-first, since the most
/// recent words are what the speaker is tracking.
const TRANSCRIPT_WIDTH: usize = 100;

/// Clear the current terminal line (replaces the transcript line).
pub fn clear_line() {
    eprint!("\r\x1b[2K");
    let _ = io::stderr().flush();
}

/// Re-render the live transcript in place.
pub fn render_transcript(text: &str) {
    let shown = tail_chars(text, TRANSCRIPT_WIDTH);
    eprint!("\r\x1b[2K  {}", shown.dimmed());
    let _ = io::stderr().flush();
}

/// Print the interviewer's next prompt as a durable line.
pub fn print_prompt(text: &str) {
    eprintln!("{} {}", "Interviewer:".bold().cyan(), text);
}

/// Print the answer being sent to the backend.
pub fn print_answer(text: &str) {
    eprintln!("{} {}", "You:".bold().green(), text);
}

/// Print a neutral status line.
pub fn print_status(message: &str) {
    eprintln!("{}", message.dimmed());
}

/// Last `max` characters of `text`, on a char boundary, with a leading
/// ellipsis when truncated.
fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let skipped = count - (max - 1);
    let tail: String = text.chars().skip(skipped).collect();
    format!("…{}", tail)
}
