//! Training job state
//!
//! One job record is live at a time. Transitions are a closed event
//! enum; every applied event is persisted whole through a `StatusStore`
//! so the last known good state survives process restarts.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Job state transitions. Each variant carries only the fields valid
/// for that transition.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// A new training job was admitted
    Started,
    /// Status poll or duplicate submission while a job is running
    InProgress,
    /// Training completed; `token` becomes the production model
    Ended { token: String },
    /// Training failed with a mapped, human-readable error
    Failed { error: String },
}

impl JobEvent {
    pub fn details(&self) -> &'static str {
        match self {
            JobEvent::Started => "New training started",
            JobEvent::InProgress => "Training in progress",
            JobEvent::Ended { .. } => "Training successfully completed",
            JobEvent::Failed { .. } => "Error occurred during training",
        }
    }
}

/// The single in-flight/most-recent training job's status record.
///
/// Optional fields are omitted from serialized output when unset, so
/// the persisted JSON and API responses only carry fields relevant to
/// the last transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobState {
    pub details: String,
    pub in_progress: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            details: "No training recorded so far".to_string(),
            in_progress: false,
            prod_model: None,
            start_time: None,
            end_time: None,
            error_time: None,
            error: None,
        }
    }
}

impl JobState {
    /// Apply a transition, updating exactly the fields it owns.
    /// `prod_model` survives everything except a successful `Ended`,
    /// which replaces it.
    pub fn apply(&mut self, event: &JobEvent) {
        self.details = event.details().to_string();
        match event {
            JobEvent::Started => {
                self.in_progress = true;
                self.start_time = Some(now());
                self.end_time = None;
                self.error_time = None;
                self.error = None;
            }
            JobEvent::InProgress => {
                self.in_progress = true;
                self.end_time = None;
                self.error_time = None;
                self.error = None;
            }
            JobEvent::Ended { token } => {
                self.in_progress = false;
                self.end_time = Some(now());
                self.prod_model = Some(token.clone());
                self.error_time = None;
                self.error = None;
            }
            JobEvent::Failed { error } => {
                self.in_progress = false;
                self.error_time = Some(now());
                self.error = Some(error.clone());
                self.end_time = None;
            }
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Durable whole-record persistence for the job state.
pub trait StatusStore: Send + Sync {
    fn save(&self, state: &JobState) -> Result<()>;
    /// `None` when no state has ever been recorded.
    fn load(&self) -> Result<Option<JobState>>;
}

/// JSON-file status store. Writes go to a temp file first and are
/// renamed into place, so a crash mid-write never leaves a torn record.
pub struct FsStatusStore {
    path: PathBuf,
}

impl FsStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatusStore for FsStatusStore {
    fn save(&self, state: &JobState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<JobState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}
