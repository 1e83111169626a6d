//! Mock media engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::compositor::{
    AudioMixSpec, CompositorError, ConcatClip, MediaEngine, MediaInfo, PlaceholderSpec,
};

/// One recorded engine operation, for step-ordering assertions.
#[derive(Debug, Clone)]
pub enum RecordedOperation {
    Probe {
        path: PathBuf,
    },
    Synthesize {
        label: String,
        duration_secs: f64,
        dest: PathBuf,
    },
    Concat {
        clips: usize,
        target_duration_secs: f64,
        dest: PathBuf,
    },
    AssembleAudio {
        narration: usize,
        has_background: bool,
        total_duration_secs: f64,
        dest: PathBuf,
    },
    Mux {
        burned_subtitles: bool,
        dest: PathBuf,
    },
}

impl RecordedOperation {
    /// Step name for quick assertions.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Probe { .. } => "probe",
            Self::Synthesize { .. } => "placeholder",
            Self::Concat { .. } => "concat",
            Self::AssembleAudio { .. } => "audio",
            Self::Mux { .. } => "mux",
        }
    }
}

#[derive(Default)]
struct Inner {
    operations: Vec<RecordedOperation>,
    probe_results: HashMap<PathBuf, MediaInfo>,
    fail_step: Option<(&'static str, String)>,
}

/// Mock implementation of the MediaEngine trait.
///
/// Provides controllable behavior for testing:
/// - Records every operation for ordering assertions
/// - Writes stub output files so downstream paths exist
/// - Configurable probe results per path
/// - Injectable failure for a chosen step
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct MockMediaEngine {
    inner: Arc<RwLock<Inner>>,
}

impl MockMediaEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the probe result for a path.
    pub async fn set_probe_result(&self, path: impl Into<PathBuf>, info: MediaInfo) {
        self.inner
            .write()
            .await
            .probe_results
            .insert(path.into(), info);
    }

    /// Make the named step ("concat", "audio", "mux", "placeholder") fail.
    pub async fn fail_step(&self, step: &'static str, reason: impl Into<String>) {
        self.inner.write().await.fail_step = Some((step, reason.into()));
    }

    /// All operations recorded so far.
    pub async fn operations(&self) -> Vec<RecordedOperation> {
        self.inner.read().await.operations.clone()
    }

    /// Step names in execution order, probes excluded.
    pub async fn step_sequence(&self) -> Vec<&'static str> {
        self.inner
            .read()
            .await
            .operations
            .iter()
            .map(RecordedOperation::step)
            .filter(|s| *s != "probe")
            .collect()
    }

    async fn check_failure(&self, step: &'static str) -> Result<(), CompositorError> {
        let inner = self.inner.read().await;
        if let Some((failing, reason)) = &inner.fail_step {
            if *failing == step {
                return Err(CompositorError::step_failed(step, reason.clone(), None));
            }
        }
        Ok(())
    }

    async fn write_stub(dest: &Path) -> Result<(), CompositorError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, b"stub media").await?;
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, CompositorError> {
        let mut inner = self.inner.write().await;
        inner.operations.push(RecordedOperation::Probe {
            path: path.to_path_buf(),
        });
        inner
            .probe_results
            .get(path)
            .cloned()
            .ok_or_else(|| CompositorError::probe_failed("no probe result configured"))
    }

    async fn synthesize_clip(
        &self,
        spec: &PlaceholderSpec,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        self.check_failure("placeholder").await?;
        Self::write_stub(dest).await?;
        self.inner
            .write()
            .await
            .operations
            .push(RecordedOperation::Synthesize {
                label: spec.label.clone(),
                duration_secs: spec.duration_secs,
                dest: dest.to_path_buf(),
            });
        Ok(())
    }

    async fn concat_clips(
        &self,
        clips: &[ConcatClip],
        target_duration_secs: f64,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        self.check_failure("concat").await?;
        Self::write_stub(dest).await?;
        self.inner
            .write()
            .await
            .operations
            .push(RecordedOperation::Concat {
                clips: clips.len(),
                target_duration_secs,
                dest: dest.to_path_buf(),
            });
        Ok(())
    }

    async fn assemble_audio(
        &self,
        spec: &AudioMixSpec,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        self.check_failure("audio").await?;
        Self::write_stub(dest).await?;
        self.inner
            .write()
            .await
            .operations
            .push(RecordedOperation::AssembleAudio {
                narration: spec.narration.len(),
                has_background: spec.background.is_some(),
                total_duration_secs: spec.total_duration_secs,
                dest: dest.to_path_buf(),
            });
        Ok(())
    }

    async fn mux(
        &self,
        _video: &Path,
        _audio: &Path,
        subtitles: Option<&Path>,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        self.check_failure("mux").await?;
        Self::write_stub(dest).await?;
        self.inner
            .write()
            .await
            .operations
            .push(RecordedOperation::Mux {
                burned_subtitles: subtitles.is_some(),
                dest: dest.to_path_buf(),
            });
        Ok(())
    }

    async fn validate(&self) -> Result<(), CompositorError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_returns_configured_result() {
        let engine = MockMediaEngine::new();
        let path = PathBuf::from("/clips/a.mp4");
        engine
            .set_probe_result(
                path.clone(),
                MediaInfo {
                    path: path.clone(),
                    duration_secs: 7.9,
                    size_bytes: 100,
                    format: "mov".to_string(),
                    video_codec: Some("h264".to_string()),
                    video_width: Some(1920),
                    video_height: Some(1080),
                    audio_codec: None,
                },
            )
            .await;

        let info = engine.probe(&path).await.unwrap();
        assert!((info.duration_secs - 7.9).abs() < 1e-9);

        let err = engine.probe(Path::new("/other.mp4")).await.unwrap_err();
        assert!(matches!(err, CompositorError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure_hits_only_named_step() {
        let engine = MockMediaEngine::new();
        engine.fail_step("mux", "boom").await;

        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("v.mp4");

        engine.concat_clips(&[], 10.0, &dest).await.unwrap();
        let err = engine
            .mux(&dest, &dest, None, &tmp.path().join("f.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompositorError::StepFailed { step: "mux", .. }));
    }

    #[tokio::test]
    async fn test_step_sequence_records_order() {
        let engine = MockMediaEngine::new();
        let tmp = tempfile::TempDir::new().unwrap();

        engine
            .concat_clips(&[], 10.0, &tmp.path().join("v.mp4"))
            .await
            .unwrap();
        engine
            .assemble_audio(
                &AudioMixSpec {
                    total_duration_secs: 10.0,
                    background: None,
                    narration: vec![],
                },
                &tmp.path().join("a.m4a"),
            )
            .await
            .unwrap();
        engine
            .mux(
                &tmp.path().join("v.mp4"),
                &tmp.path().join("a.m4a"),
                None,
                &tmp.path().join("f.mp4"),
            )
            .await
            .unwrap();

        assert_eq!(engine.step_sequence().await, vec!["concat", "audio", "mux"]);
    }
}
