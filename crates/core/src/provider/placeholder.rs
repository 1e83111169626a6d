//! Local placeholder clip generator.
//!
//! The last entry in every provider chain. Synthesizes a solid-color clip of
//! the requested duration with a scene label overlay, so a scene always
//! resolves to a clip even when every real provider fails. Synchronous: the
//! result comes back inline on submit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::compositor::{MediaEngine, PlaceholderSpec};

use super::traits::ProviderAdapter;
use super::types::{GenerationRequest, PollStatus, ProviderError, SubmitAck};

/// Name under which the placeholder appears in results and logs.
pub const PLACEHOLDER_PROVIDER_NAME: &str = "placeholder";

/// Muted background palette; the prompt hash picks the entry, so the same
/// request always yields the same clip.
const PALETTE: &[&str] = &[
    "0x1e2430", "0x2b1e30", "0x1e3028", "0x30281e", "0x1e2a3a", "0x33202a",
];

/// Configuration for the placeholder generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Directory for synthesized clips before they are claimed by a scene.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Frame rate of synthesized clips.
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("reelforge-placeholder")
}

fn default_fps() -> u32 {
    30
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            fps: default_fps(),
        }
    }
}

/// Picks a deterministic background color for a prompt.
fn color_for_prompt(prompt: &str) -> &'static str {
    let digest = Sha256::digest(prompt.as_bytes());
    PALETTE[digest[0] as usize % PALETTE.len()]
}

/// Builds the overlay label for a scene.
fn scene_label(req: &GenerationRequest) -> String {
    match &req.mood {
        Some(mood) if !mood.is_empty() => format!("Scene {} - {}", req.scene_index + 1, mood),
        _ => format!("Scene {}", req.scene_index + 1),
    }
}

/// Always-available local clip generator.
pub struct PlaceholderProvider<E: MediaEngine> {
    config: PlaceholderConfig,
    engine: Arc<E>,
}

impl<E: MediaEngine> PlaceholderProvider<E> {
    /// Creates a new placeholder generator backed by the given media engine.
    pub fn new(config: PlaceholderConfig, engine: Arc<E>) -> Self {
        Self { config, engine }
    }
}

#[async_trait]
impl<E: MediaEngine + 'static> ProviderAdapter for PlaceholderProvider<E> {
    fn name(&self) -> &str {
        PLACEHOLDER_PROVIDER_NAME
    }

    async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let dest = self.config.temp_dir.join(format!("{}.mp4", job_id));
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let (width, height) = req.aspect_ratio.resolution();
        let spec = PlaceholderSpec {
            label: scene_label(req),
            duration_secs: req.duration_secs,
            width,
            height,
            fps: self.config.fps,
            color: color_for_prompt(&req.prompt).to_string(),
        };

        debug!(scene = req.scene_index, path = %dest.display(), "synthesizing placeholder clip");

        self.engine
            .synthesize_clip(&spec, &dest)
            .await
            .map_err(|e| ProviderError::unavailable(format!("placeholder synthesis: {}", e)))?;

        Ok(SubmitAck::completed(job_id, dest.to_string_lossy()))
    }

    async fn poll(&self, job_id: &str) -> Result<PollStatus, ProviderError> {
        // Results are always inline; a poll means the caller lost the ack.
        Err(ProviderError::JobNotFound {
            job_id: job_id.to_string(),
        })
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn download(&self, source: &str, dest: &Path) -> Result<(), ProviderError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(Path::new(source), dest).await?;
        let _ = tokio::fs::remove_file(Path::new(source)).await;
        Ok(())
    }
}
