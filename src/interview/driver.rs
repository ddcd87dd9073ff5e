//! Interview session driver: the single event loop that owns the turn
//! controller, the debounce timer, and the one live listener.
//!
//! All state transitions happen on this loop. Slow work (relay calls,
//! playback, listener restarts) runs as spawned tasks that report back
//! over one internal channel, so fragment handling is never blocked
//! behind a backend call.

use crate::audio::frame::AudioFrame;
use crate::error::Result;
use crate::interview::SessionContext;
use crate::interview::listener::{Listener, ListenerFactory};
use crate::output;
use crate::playback::SpeechPlayback;
use crate::relay::{AnswerRelay, RelayOutcome, SkipReason};
use crate::transcribe::session::StreamEvent;
use crate::turn::{DebounceTimer, SessionState, TurnAction, TurnController, TurnEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Driver tuning, derived from config by the composition root.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Silence debounce window.
    pub silence_window: Duration,
    /// Settling delay before re-arming the microphone after playback.
    pub resume_delay: Duration,
    pub quiet: bool,
    pub verbosity: u8,
}

/// Completions reported by spawned tasks.
enum TaskOutcome {
    RelayDone(Result<RelayOutcome>),
    PlaybackDone,
    ListenerReady(Result<Listener>),
}

/// One select-loop input, kept free of `self` borrows so the handlers can
/// mutate the driver after the branch resolves.
enum LoopInput {
    Stop,
    Task(TaskOutcome),
    Silence,
    Frame(AudioFrame),
    Event(Option<StreamEvent>),
}

/// The live listener, decomposed for independent channel polling. The
/// frame receiver drops to `None` when a finite source (WAV replay) is
/// exhausted; transcript events keep flowing until the stream closes.
struct Wired {
    frames: Option<mpsc::Receiver<AudioFrame>>,
    events: mpsc::Receiver<StreamEvent>,
    session: crate::transcribe::session::SessionHandle,
    capture: crate::audio::pump::CaptureHandle,
}

impl Wired {
    fn from_listener(listener: Listener) -> Self {
        Self {
            frames: Some(listener.frames),
            events: listener.events,
            session: listener.session,
            capture: listener.capture,
        }
    }

    fn close(&self) {
        self.capture.stop();
        self.session.close();
    }
}

/// Await the next frame; parks forever once the pump is exhausted so the
/// select loop never spins on a closed channel.
async fn next_frame(frames: &mut Option<mpsc::Receiver<AudioFrame>>) -> AudioFrame {
    loop {
        match frames {
            Some(rx) => match rx.recv().await {
                Some(frame) => return frame,
                None => *frames = None,
            },
            None => std::future::pending().await,
        }
    }
}

/// One interview session from start to stop.
pub struct InterviewSession {
    controller: TurnController,
    timer: DebounceTimer,
    options: SessionOptions,
    ctx: SessionContext,
    relay: Arc<dyn AnswerRelay>,
    playback: Arc<dyn SpeechPlayback>,
    factory: Arc<dyn ListenerFactory>,
}

impl InterviewSession {
    pub fn new(
        ctx: SessionContext,
        relay: Arc<dyn AnswerRelay>,
        playback: Arc<dyn SpeechPlayback>,
        factory: Arc<dyn ListenerFactory>,
        options: SessionOptions,
    ) -> Self {
        Self {
            controller: TurnController::new(),
            timer: DebounceTimer::new(options.silence_window),
            options,
            ctx,
            relay,
            playback,
            factory,
        }
    }

    /// Run the session until it stops.
    ///
    /// `stop_rx` is the manual-stop signal (Ctrl-C in the terminal app).
    /// The first listener open is fatal on failure; later failures stop
    /// the session gracefully.
    pub async fn run(mut self, mut stop_rx: mpsc::Receiver<()>) -> Result<()> {
        let (task_tx, mut task_rx) = mpsc::channel::<TaskOutcome>(16);

        let start_actions = self.controller.handle(TurnEvent::Start);
        debug_assert_eq!(start_actions, vec![TurnAction::OpenListener]);
        let mut active = Some(Wired::from_listener(self.factory.open().await?));

        if !self.options.quiet {
            output::print_status("Listening. Speak when ready; Ctrl-C ends the session.");
        }

        loop {
            let input = match active.as_mut() {
                Some(wired) => tokio::select! {
                    biased;
                    _ = stop_rx.recv() => LoopInput::Stop,
                    Some(outcome) = task_rx.recv() => LoopInput::Task(outcome),
                    _ = self.timer.elapsed() => LoopInput::Silence,
                    event = wired.events.recv() => LoopInput::Event(event),
                    frame = next_frame(&mut wired.frames) => LoopInput::Frame(frame),
                },
                None => tokio::select! {
                    biased;
                    _ = stop_rx.recv() => LoopInput::Stop,
                    Some(outcome) = task_rx.recv() => LoopInput::Task(outcome),
                    _ = self.timer.elapsed() => LoopInput::Silence,
                },
            };

            let events = match input {
                LoopInput::Stop => vec![TurnEvent::ManualStop],
                LoopInput::Silence => vec![TurnEvent::SilenceElapsed],
                LoopInput::Task(outcome) => self.task_events(outcome, &mut active),
                LoopInput::Frame(frame) => {
                    // Transmit only while Listening (the session handle
                    // also drops sends once closed)
                    if self.controller.state() == SessionState::Listening
                        && let Some(wired) = active.as_ref()
                    {
                        wired.session.send_frame(&frame);
                    }
                    vec![]
                }
                LoopInput::Event(event) => self.stream_events(event),
            };

            for event in events {
                let actions = self.controller.handle(event);
                self.apply(actions, &mut active, &task_tx).await;
            }

            // Stopped is terminal, but a final flush may still be in
            // flight; wait for its completion so the closing prompt prints.
            if self.controller.state() == SessionState::Stopped
                && !self.controller.send_pending()
            {
                break;
            }
        }

        if let Some(wired) = active.take() {
            wired.close();
        }
        if !self.options.quiet {
            output::clear_line();
            output::print_status("Session ended.");
        }
        Ok(())
    }

    /// Map a stream event to controller events.
    fn stream_events(&mut self, event: Option<StreamEvent>) -> Vec<TurnEvent> {
        match event {
            Some(StreamEvent::Fragment(fragment)) => vec![TurnEvent::Fragment {
                text: fragment.text,
                is_final: fragment.is_final,
            }],
            Some(StreamEvent::Error(message)) => {
                output::clear_line();
                eprintln!("Stream error: {}", message);
                vec![] // the reader emits Closed right after
            }
            Some(StreamEvent::Closed) | None => vec![TurnEvent::StreamEnded],
        }
    }

    /// Map a task completion to controller events.
    fn task_events(&mut self, outcome: TaskOutcome, active: &mut Option<Wired>) -> Vec<TurnEvent> {
        match outcome {
            TaskOutcome::RelayDone(Ok(RelayOutcome::Delivered { prompt, .. })) => {
                // Printed even after a manual stop: a prompt that raced the
                // stop is shown, just never spoken
                if let Some(text) = prompt.as_deref().filter(|p| !p.trim().is_empty())
                    && !self.options.quiet
                {
                    output::clear_line();
                    output::print_prompt(text);
                }
                vec![TurnEvent::AnswerDelivered { prompt }]
            }
            TaskOutcome::RelayDone(Ok(RelayOutcome::Skipped(reason))) => {
                if self.options.verbosity >= 1 {
                    let why = match reason {
                        SkipReason::Blank => "blank answer",
                        SkipReason::Duplicate => "unchanged answer",
                        SkipReason::Busy => "send already in progress",
                    };
                    eprintln!("Skipped send: {}", why);
                }
                vec![TurnEvent::AnswerNotDelivered]
            }
            TaskOutcome::RelayDone(Err(e)) => {
                // Recoverable: the turn does not advance, the user may
                // simply speak again
                output::clear_line();
                eprintln!("Could not reach the interview backend: {}", e);
                vec![TurnEvent::AnswerNotDelivered]
            }
            TaskOutcome::PlaybackDone => vec![TurnEvent::PlaybackFinished],
            TaskOutcome::ListenerReady(Ok(listener)) => {
                if self.controller.state() == SessionState::Listening {
                    *active = Some(Wired::from_listener(listener));
                } else {
                    // Stopped while the restart was settling
                    listener.close();
                }
                vec![]
            }
            TaskOutcome::ListenerReady(Err(e)) => {
                eprintln!("Could not re-arm the microphone: {}", e);
                vec![TurnEvent::StreamEnded]
            }
        }
    }

    /// Execute controller actions in order.
    async fn apply(
        &mut self,
        actions: Vec<TurnAction>,
        active: &mut Option<Wired>,
        task_tx: &mpsc::Sender<TaskOutcome>,
    ) {
        for action in actions {
            match action {
                TurnAction::OpenListener => {
                    // Only emitted by Start, which run() handles inline
                }
                TurnAction::ArmSilence => self.timer.arm(),
                TurnAction::CancelSilence => self.timer.cancel(),
                TurnAction::SendAnswer(text) => {
                    if !self.options.quiet {
                        output::clear_line();
                        output::print_answer(&text);
                    }
                    let relay = self.relay.clone();
                    let ctx = self.ctx.clone();
                    let tx = task_tx.clone();
                    tokio::spawn(async move {
                        let result = relay.send_answer(&ctx, &text).await;
                        let _ = tx.send(TaskOutcome::RelayDone(result)).await;
                    });
                }
                TurnAction::StopListener | TurnAction::CloseListener => {
                    // Best-effort teardown: both sides are idempotent
                    if let Some(wired) = active.take() {
                        wired.close();
                    }
                }
                TurnAction::Speak(text) => {
                    let playback = self.playback.clone();
                    let tx = task_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = playback.speak(&text).await {
                            // Failure resolves the same way as success so
                            // the session can never stall in AiSpeaking
                            eprintln!("Playback failed: {}", e);
                        }
                        let _ = tx.send(TaskOutcome::PlaybackDone).await;
                    });
                }
                TurnAction::RestartListener => {
                    let factory = self.factory.clone();
                    let delay = self.options.resume_delay;
                    let tx = task_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let result = factory.open().await;
                        let _ = tx.send(TaskOutcome::ListenerReady(result)).await;
                    });
                }
                TurnAction::NotifyDisconnected => {
                    output::clear_line();
                    eprintln!("Connection lost. Start a new session to continue.");
                }
            }
        }

        // Refresh the live transcript line after any fragment-driven change
        if !self.options.quiet && self.controller.state() == SessionState::Listening {
            let display = self.controller.display();
            if !display.is_empty() {
                output::render_transcript(&display);
            }
        }
    }
}
