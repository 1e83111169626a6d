//! Trait definition for the media engine seam.

use async_trait::async_trait;
use std::path::Path;

use super::error::CompositorError;
use super::types::{AudioMixSpec, ConcatClip, MediaInfo, PlaceholderSpec};

/// Low-level media operations the compositor and placeholder generator are
/// built on. One implementation shells out to ffmpeg; tests substitute a
/// mock.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Probes a media file for duration and stream information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, CompositorError>;

    /// Synthesizes a solid-color labeled clip.
    async fn synthesize_clip(
        &self,
        spec: &PlaceholderSpec,
        dest: &Path,
    ) -> Result<(), CompositorError>;

    /// Concatenates clips in order into a video-only stream of exactly
    /// `target_duration_secs` (trimming excess, holding the last frame to
    /// fill a shortfall).
    async fn concat_clips(
        &self,
        clips: &[ConcatClip],
        target_duration_secs: f64,
        dest: &Path,
    ) -> Result<(), CompositorError>;

    /// Builds one flat audio track of exactly the spec's total duration.
    async fn assemble_audio(&self, spec: &AudioMixSpec, dest: &Path)
        -> Result<(), CompositorError>;

    /// Muxes the concatenated video with the assembled audio, truncating to
    /// the shorter stream; optionally burns in subtitles.
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        subtitles: Option<&Path>,
        dest: &Path,
    ) -> Result<(), CompositorError>;

    /// Validates that the engine is ready to use.
    async fn validate(&self) -> Result<(), CompositorError>;
}
