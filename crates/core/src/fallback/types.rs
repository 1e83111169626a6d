//! Types for the provider fallback system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::provider::{ProviderError, Transition};

/// Outcome of one provider attempt for a scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The attempt produced the scene clip.
    Succeeded,
    /// The provider reported a terminal generation failure.
    Failed,
    /// The job hit its wall-clock deadline.
    TimedOut,
    /// The provider rejected the request outright.
    Rejected,
    /// The provider could not be reached.
    Unavailable,
}

/// Record of one provider attempt, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Provider that was tried.
    pub provider: String,
    /// Provider-side job id, when submission succeeded.
    pub job_id: Option<String>,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Failure description, when there was one.
    pub error: Option<String>,
}

/// The resolved clip for one scene. Produced exactly once per scene;
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneResult {
    /// Position of the scene in the final video.
    pub scene_index: usize,
    /// Provider that produced the clip.
    pub provider: String,
    /// Local clip file.
    pub clip_path: PathBuf,
    /// Measured clip duration in seconds (requested duration when probing
    /// was not possible).
    pub duration_secs: f64,
    /// True when the clip came from the placeholder generator.
    pub used_fallback: bool,
    /// Boundary transition carried from the request.
    #[serde(default)]
    pub transition: Transition,
    /// Every provider attempt made for this scene, in order.
    pub attempts: Vec<AttemptRecord>,
}

/// Errors from a fallback resolution.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The run was cancelled by the caller.
    #[error("scene resolution cancelled")]
    Cancelled,

    /// The local placeholder generator itself failed. With a validated
    /// media engine this indicates a broken environment, not a provider
    /// outage.
    #[error("placeholder generation failed for scene {scene_index}: {source}")]
    PlaceholderFailed {
        scene_index: usize,
        #[source]
        source: ProviderError,
    },
}
