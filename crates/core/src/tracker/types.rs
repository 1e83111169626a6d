//! Types for the job tracking state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderError;

/// Lifecycle state of one provider job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the provider, not yet observed processing.
    Submitted,
    /// Provider reported the job queued or running.
    Processing,
    /// Result is available.
    Succeeded,
    /// Provider reported a terminal failure.
    Failed,
    /// The wall-clock deadline elapsed before a terminal status.
    TimedOut,
}

impl JobState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }
}

/// One generation job as driven to completion by a [`JobTracker`].
///
/// Owned exclusively by the tracker run that created it; handed out only
/// once the state is terminal.
///
/// [`JobTracker`]: crate::tracker::JobTracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderJob {
    /// Provider that accepted the job.
    pub provider: String,
    /// Opaque provider-side job id.
    pub job_id: String,
    /// When the job was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Current (final, once returned) state.
    pub state: JobState,
    /// Result reference when the state is Succeeded.
    pub result_url: Option<String>,
    /// Failure description when the state is Failed or TimedOut.
    pub error: Option<String>,
}

/// Errors from a tracker run.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The provider failed before the job reached a terminal state (failed
    /// submission, or polling broke down).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The run was cancelled by the caller.
    #[error("job tracking cancelled")]
    Cancelled,
}
