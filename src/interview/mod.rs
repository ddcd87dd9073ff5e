//! Interview session driving: context, plan loading, listener wiring, and
//! the event-loop driver that executes turn-controller actions.

pub mod driver;
pub mod listener;

pub use driver::{InterviewSession, SessionOptions};
pub use listener::{Listener, ListenerFactory, MockListenerFactory};

use crate::error::{Result, VivaError};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

/// Per-session identity and timing, owned by one driver instance.
///
/// Replaces the scattered module-level refs of ad hoc implementations:
/// everything the relay needs to label an answer lives here and is passed
/// by reference.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    started: Instant,
}

impl SessionContext {
    pub fn new(session_id: String, candidate_name: String, candidate_email: String) -> Self {
        Self {
            session_id,
            candidate_name,
            candidate_email,
            started: Instant::now(),
        }
    }

    /// Elapsed session time as the `MM:SS` label sent with each answer.
    pub fn elapsed_label(&self) -> String {
        let total_seconds = self.started.elapsed().as_secs();
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

/// Interview plan loaded from a JSON file: session identity plus the
/// question list registered with the backend before the first turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPlan {
    #[serde(alias = "_id")]
    pub session_id: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_email: String,
}

impl InterviewPlan {
    /// Load and validate a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let plan: InterviewPlan =
            serde_json::from_str(&contents).map_err(|e| VivaError::Other(format!(
                "Invalid interview plan {}: {}",
                path.display(),
                e
            )))?;
        if plan.session_id.is_empty() {
            return Err(VivaError::Other(format!(
                "Interview plan {} has no session id",
                path.display()
            )));
        }
        Ok(plan)
    }

    /// Build the session context for this plan, starting the clock now.
    pub fn context(&self) -> SessionContext {
        SessionContext::new(
            self.session_id.clone(),
            self.candidate_name.clone(),
            self.candidate_email.clone(),
        )
    }
}
