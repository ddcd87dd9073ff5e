//! Turn-taking state machine.
//!
//! Pure logic: the controller receives one event at a time through
//! [`TurnController::handle`] and returns the actions the session driver
//! must execute. It performs no I/O and holds no clocks, so every
//! transition is unit-testable.
//!
//! ```text
//! Idle ──Start──▶ Listening ◀──PlaybackFinished── AiSpeaking
//!                    │  ▲                            ▲
//!                    │  └──────AnswerDelivered───────┘
//!                    └──ManualStop / StreamEnded──▶ Stopped
//! ```

use crate::turn::buffer::UtteranceBuffer;

/// Session lifecycle states. `Listening` and `AiSpeaking` are mutually
/// exclusive; `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    AiSpeaking,
    Stopped,
}

/// Inputs to the state machine, delivered strictly in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// User started the session.
    Start,
    /// A transcript fragment arrived from the streaming engine.
    Fragment { text: String, is_final: bool },
    /// The silence debounce window elapsed with no new fragment.
    SilenceElapsed,
    /// The relay delivered the answer; `prompt` is the next thing to speak.
    AnswerDelivered { prompt: Option<String> },
    /// The relay call failed or was skipped; the turn does not advance.
    AnswerNotDelivered,
    /// Speech playback completed (success and failure are equivalent).
    PlaybackFinished,
    /// The streaming connection closed.
    StreamEnded,
    /// User ended the turn or session.
    ManualStop,
}

/// Side effects the driver must perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnAction {
    /// Open the capture + transcription pair.
    OpenListener,
    /// Restart (or start) the silence debounce window.
    ArmSilence,
    /// Cancel the pending debounce window.
    CancelSilence,
    /// Send the flushed utterance to the conversation backend.
    SendAnswer(String),
    /// Stop the listener before playback (best-effort).
    StopListener,
    /// Play the prompt as synthesized speech.
    Speak(String),
    /// Reopen the listener after playback (after the settling delay).
    RestartListener,
    /// Tear down the listener for good.
    CloseListener,
    /// Tell the user the stream dropped and the session is over.
    NotifyDisconnected,
}

/// Reconciles interim/final fragments, owns the utterance buffer, and
/// decides when a turn is complete.
#[derive(Debug)]
pub struct TurnController {
    state: SessionState,
    buffer: UtteranceBuffer,
    interim: String,
    /// One relay call at a time; also the one-shot guard that keeps the
    /// silence flush and a manual-stop flush from double-sending.
    send_pending: bool,
}

impl TurnController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            buffer: UtteranceBuffer::new(),
            interim: String::new(),
            send_pending: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while a `SendAnswer` is outstanding (no delivery event yet).
    pub fn send_pending(&self) -> bool {
        self.send_pending
    }

    /// Live transcript view: settled buffer plus the transient interim tail.
    pub fn display(&self) -> String {
        if self.interim.is_empty() {
            self.buffer.as_str().to_string()
        } else if self.buffer.is_empty() {
            self.interim.clone()
        } else {
            format!("{} {}", self.buffer.as_str(), self.interim)
        }
    }

    /// Feed one event through the (state, event) table.
    pub fn handle(&mut self, event: TurnEvent) -> Vec<TurnAction> {
        match (self.state, event) {
            (SessionState::Idle, TurnEvent::Start) => {
                self.buffer.clear();
                self.interim.clear();
                self.state = SessionState::Listening;
                vec![TurnAction::OpenListener]
            }

            (SessionState::Listening, TurnEvent::Fragment { text, is_final }) => {
                self.absorb_fragment(&text, is_final);
                // Every fragment restarts the silence window
                vec![TurnAction::ArmSilence]
            }

            // The engine may emit trailing fragments while being torn down.
            // Capture the text (preserve policy) but never arm the timer.
            (SessionState::AiSpeaking, TurnEvent::Fragment { text, is_final }) => {
                self.absorb_fragment(&text, is_final);
                vec![]
            }

            (SessionState::Listening, TurnEvent::SilenceElapsed) => {
                if self.buffer.is_empty() || self.send_pending {
                    vec![TurnAction::CancelSilence]
                } else {
                    self.send_pending = true;
                    self.interim.clear();
                    vec![
                        TurnAction::CancelSilence,
                        TurnAction::SendAnswer(self.buffer.take()),
                    ]
                }
            }

            (SessionState::Listening, TurnEvent::AnswerDelivered { prompt }) => {
                self.send_pending = false;
                match prompt.filter(|p| !p.trim().is_empty()) {
                    Some(prompt) => {
                        self.state = SessionState::AiSpeaking;
                        vec![
                            TurnAction::CancelSilence,
                            TurnAction::StopListener,
                            TurnAction::Speak(prompt),
                        ]
                    }
                    // No prompt to speak: stay listening. Re-arm if text
                    // accumulated while the call was in flight.
                    None if !self.buffer.is_empty() => vec![TurnAction::ArmSilence],
                    None => vec![],
                }
            }

            (SessionState::Listening, TurnEvent::AnswerNotDelivered) => {
                self.send_pending = false;
                if self.buffer.is_empty() {
                    vec![]
                } else {
                    vec![TurnAction::ArmSilence]
                }
            }

            // Delivery resolved after the mode switch or after stop; just
            // release the guard.
            (_, TurnEvent::AnswerDelivered { .. }) | (_, TurnEvent::AnswerNotDelivered) => {
                self.send_pending = false;
                vec![]
            }

            (SessionState::AiSpeaking, TurnEvent::PlaybackFinished) => {
                self.state = SessionState::Listening;
                vec![TurnAction::RestartListener]
            }

            (SessionState::Listening, TurnEvent::ManualStop) => {
                self.state = SessionState::Stopped;
                let mut actions = vec![TurnAction::CancelSilence];
                // Flush exactly once: settled text first, else the interim.
                let flush = if self.buffer.is_empty() {
                    std::mem::take(&mut self.interim)
                } else {
                    self.buffer.take()
                };
                self.interim.clear();
                if !flush.trim().is_empty() && !self.send_pending {
                    self.send_pending = true;
                    actions.push(TurnAction::SendAnswer(flush));
                }
                actions.push(TurnAction::CloseListener);
                actions
            }

            // Stopping mid-prompt discards nothing worth sending: the mic is
            // muted while the AI speaks, so there is no new utterance.
            (SessionState::AiSpeaking, TurnEvent::ManualStop) => {
                self.state = SessionState::Stopped;
                vec![TurnAction::CancelSilence, TurnAction::CloseListener]
            }

            (SessionState::Listening, TurnEvent::StreamEnded) => {
                self.state = SessionState::Stopped;
                vec![
                    TurnAction::CancelSilence,
                    TurnAction::NotifyDisconnected,
                    TurnAction::CloseListener,
                ]
            }

            // Expected closes: engine teardown for playback, or after a
            // manual stop already ran the flush.
            (SessionState::AiSpeaking, TurnEvent::StreamEnded)
            | (SessionState::Stopped, TurnEvent::StreamEnded) => vec![],

            // Everything else is a no-op in the current state.
            (_, _) => vec![],
        }
    }

    fn absorb_fragment(&mut self, text: &str, is_final: bool) {
        if is_final {
            self.buffer.push_final(text);
            self.interim.clear();
        } else {
            self.interim = text.to_string();
        }
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new()
    }
}
