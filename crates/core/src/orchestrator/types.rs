//! Types for the scene orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::fallback::SceneResult;
use crate::provider::ProviderError;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Two requests share a scene index.
    #[error("duplicate scene index: {0}")]
    DuplicateSceneIndex(usize),

    /// The run's working directory could not be prepared.
    #[error("failed to prepare working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The placeholder generator failed; the environment cannot resolve
    /// scenes at all.
    #[error("placeholder generation failed for scene {scene_index}: {source}")]
    PlaceholderFailure {
        scene_index: usize,
        #[source]
        source: ProviderError,
    },
}

/// Context for one generation run, passed explicitly through the pipeline
/// stages instead of living in shared session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Unique id of this run.
    pub run_id: String,
    /// Directory holding the run's clips and intermediate files.
    pub work_dir: PathBuf,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// Creates a context with a fresh run id rooted at `work_dir`.
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            work_dir,
            started_at: Utc::now(),
        }
    }

    /// Directory scene clips are downloaded into.
    pub fn clips_dir(&self) -> PathBuf {
        self.work_dir.join("clips")
    }

    /// Canonical clip path for a scene.
    pub fn clip_path(&self, scene_index: usize) -> PathBuf {
        self.clips_dir()
            .join(format!("scene_{:03}.mp4", scene_index))
    }
}

/// Outcome of an orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Scene results sorted by scene index. Complete when the run was not
    /// cancelled; on cancellation it holds every scene that finished.
    pub results: Vec<SceneResult>,
    /// Scenes that only succeeded via the placeholder fallback, for
    /// user-visible degradation reporting.
    pub placeholder_scenes: Vec<usize>,
    /// True when the run ended through cancellation or the run deadline.
    pub cancelled: bool,
}

impl RunReport {
    /// Whether every requested scene has a result.
    pub fn is_complete(&self, requested: usize) -> bool {
        self.results.len() == requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_paths() {
        let ctx = RunContext::new(PathBuf::from("/work/run"));
        assert_eq!(ctx.clips_dir(), PathBuf::from("/work/run/clips"));
        assert_eq!(
            ctx.clip_path(3),
            PathBuf::from("/work/run/clips/scene_003.mp4")
        );
        assert!(!ctx.run_id.is_empty());
    }

    #[test]
    fn test_run_context_ids_are_unique() {
        let a = RunContext::new(PathBuf::from("/work"));
        let b = RunContext::new(PathBuf::from("/work"));
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::DuplicateSceneIndex(4);
        assert_eq!(err.to_string(), "duplicate scene index: 4");
    }
}
