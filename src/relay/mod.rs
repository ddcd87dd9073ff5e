//! Conversation relay: finalized answers out, next prompt back.
//!
//! The relay suppresses blank and duplicate sends and rejects a second
//! call while one is in flight. Skips are outcomes, not errors, so a
//! skipped flush never disturbs the session.

use crate::error::{Result, VivaError};
use crate::interview::SessionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why a send was skipped without reaching the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trimmed text was empty.
    Blank,
    /// Trimmed text equals the last successfully sent answer.
    Duplicate,
    /// Another relay call is already in flight.
    Busy,
}

/// Result of a `send_answer` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The backend accepted the answer; `prompt` is the next thing to speak.
    Delivered {
        prompt: Option<String>,
        question_index: Option<u32>,
    },
    /// Nothing was sent; not an error.
    Skipped(SkipReason),
}

/// Seam for the conversation backend, so the driver can run against a
/// recorded double in tests.
#[async_trait]
pub trait AnswerRelay: Send + Sync {
    async fn send_answer(&self, ctx: &SessionContext, text: &str) -> Result<RelayOutcome>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConductRequest<'a> {
    session_id: &'a str,
    user_answer: &'a str,
    time: String,
    candidate_name: &'a str,
    candidate_email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConductResponse {
    #[serde(default)]
    ai_response: Option<String>,
    #[serde(default)]
    current_question_index: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    session_id: &'a str,
    questions: &'a [String],
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the interview backend.
pub struct ConversationRelay {
    client: reqwest::Client,
    start_url: String,
    conduct_url: String,
    in_flight: AtomicBool,
    last_sent: Mutex<String>,
}

/// Releases the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ConversationRelay {
    pub fn new(client: reqwest::Client, start_url: String, conduct_url: String) -> Self {
        Self {
            client,
            start_url,
            conduct_url,
            in_flight: AtomicBool::new(false),
            last_sent: Mutex::new(String::new()),
        }
    }

    /// Register the session and its question list before the first turn.
    ///
    /// `POST {start_url}` with `{ sessionId, questions }`. Returns the
    /// backend's acknowledgment message.
    pub async fn start_session(&self, session_id: &str, questions: &[String]) -> Result<String> {
        let response = self
            .client
            .post(&self.start_url)
            .json(&StartRequest {
                session_id,
                questions,
            })
            .send()
            .await
            .map_err(|e| VivaError::RelayUnavailable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(VivaError::RelayUnavailable {
                message: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let ack: StartResponse =
            response
                .json()
                .await
                .map_err(|e| VivaError::RelayUnavailable {
                    message: format!("invalid start response: {}", e),
                })?;

        Ok(ack.message.unwrap_or_else(|| "session ready".to_string()))
    }

    fn last_sent_equals(&self, trimmed: &str) -> bool {
        self.last_sent
            .lock()
            .map(|last| *last == trimmed)
            .unwrap_or(false)
    }

    fn record_sent(&self, trimmed: &str) {
        if let Ok(mut last) = self.last_sent.lock() {
            *last = trimmed.to_string();
        }
    }
}

#[async_trait]
impl AnswerRelay for ConversationRelay {
    /// Exchange one finalized answer for the next prompt.
    ///
    /// `POST {conduct_url}` with the answer plus session identity and the
    /// elapsed-time label. Blank text, a repeat of the last sent answer,
    /// and a call racing an in-flight one are all skipped, not errored.
    async fn send_answer(&self, ctx: &SessionContext, text: &str) -> Result<RelayOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(RelayOutcome::Skipped(SkipReason::Blank));
        }
        if self.last_sent_equals(trimmed) {
            return Ok(RelayOutcome::Skipped(SkipReason::Duplicate));
        }
        // Reject, never queue: a silence flush racing a manual-stop flush
        // must produce one submission.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(RelayOutcome::Skipped(SkipReason::Busy));
        }
        let _guard = InFlightGuard(&self.in_flight);

        let request = ConductRequest {
            session_id: &ctx.session_id,
            user_answer: trimmed,
            time: ctx.elapsed_label(),
            candidate_name: &ctx.candidate_name,
            candidate_email: &ctx.candidate_email,
        };

        let response = self
            .client
            .post(&self.conduct_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VivaError::RelayUnavailable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(VivaError::RelayUnavailable {
                message: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let reply: ConductResponse =
            response
                .json()
                .await
                .map_err(|e| VivaError::RelayUnavailable {
                    message: format!("invalid conduct response: {}", e),
                })?;

        self.record_sent(trimmed);

        Ok(RelayOutcome::Delivered {
            prompt: reply.ai_response,
            question_index: reply.current_question_index,
        })
    }
}

/// Recording relay double for driver tests.
pub struct MockRelay {
    pub sent: Mutex<Vec<String>>,
    prompts: Mutex<Vec<Option<String>>>,
    fail: bool,
}

impl MockRelay {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Queue prompts returned by successive sends (in order).
    pub fn with_prompts(self, prompts: Vec<Option<String>>) -> Self {
        if let Ok(mut queue) = self.prompts.lock() {
            *queue = prompts;
            queue.reverse(); // pop from the back
        }
        self
    }

    /// Make every send fail with `RelayUnavailable`.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn sent_answers(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerRelay for MockRelay {
    async fn send_answer(&self, _ctx: &SessionContext, text: &str) -> Result<RelayOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(RelayOutcome::Skipped(SkipReason::Blank));
        }
        if self.fail {
            return Err(VivaError::RelayUnavailable {
                message: "mock relay failure".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(trimmed.to_string());
        }
        let prompt = self
            .prompts
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop())
            .flatten();
        Ok(RelayOutcome::Delivered {
            prompt,
            question_index: None,
        })
    }
}
