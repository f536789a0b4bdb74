//! Types for the download orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that stop a run before the loop starts.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Downloads folder or setlist file missing.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Setlist could not be read.
    #[error("setlist error: {0}")]
    Setlist(#[from] crate::setlist::SetlistError),

    /// No session could be opened.
    #[error("session unavailable: {0}")]
    SessionUnavailable(#[from] crate::session::SessionError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every item was processed.
    Done,
    /// Preconditions failed; nothing was processed.
    Aborted,
    /// A session could not be (re)created mid-run.
    Fatal,
    /// Interrupted by the operator.
    Cancelled,
}

impl RunStatus {
    /// Process exit code for this status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Done => 0,
            Self::Aborted => 2,
            Self::Fatal => 3,
            Self::Cancelled => 130,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Done => "done",
            Self::Aborted => "aborted",
            Self::Fatal => "fatal",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Download triggered and its markers came and went.
    Completed {
        /// Regular files that appeared in the downloads folder.
        new_artifacts: Vec<PathBuf>,
        /// Newest file present before the trigger, if any.
        latest_before: Option<PathBuf>,
        /// Time spent waiting for the markers to clear.
        #[serde(with = "duration_millis")]
        waited: Duration,
    },
    /// Automation or detection failed; the run moves on.
    SoftFailed { reason: String },
    /// The downloads folder could not be read.
    Skipped { reason: String },
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Per-item entry in a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    /// Setlist line the item came from.
    pub line: usize,
    pub label: String,
    pub outcome: ItemOutcome,
    pub finished_at: DateTime<Utc>,
}

/// Summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub items: Vec<ItemReport>,
    /// Soft rotations performed.
    pub rotations: u32,
    /// Hard restarts performed.
    pub restarts: u32,
    /// Sessions replaced after the browser went away.
    pub session_recoveries: u32,
    /// Why the run stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            status: RunStatus::Done,
            items: Vec::new(),
            rotations: 0,
            restarts: 0,
            session_recoveries: 0,
            diagnostic: None,
            started_at: now,
            finished_at: now,
        }
    }

    /// A run that stopped before processing anything.
    pub fn aborted(diagnostic: impl Into<String>) -> Self {
        Self::start().finish(RunStatus::Aborted, Some(diagnostic.into()))
    }

    pub(crate) fn finish(mut self, status: RunStatus, diagnostic: Option<String>) -> Self {
        self.status = status;
        self.diagnostic = diagnostic;
        self.finished_at = Utc::now();
        self
    }

    pub fn completed(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_completed()).count()
    }

    pub fn soft_failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::SoftFailed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Skipped { .. }))
            .count()
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
