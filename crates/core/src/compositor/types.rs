//! Types for the compositor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Basic media information from probing a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path that was probed.
    pub path: PathBuf,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Container format name.
    pub format: String,
    /// Video codec, if a video stream exists.
    pub video_codec: Option<String>,
    /// Video width in pixels.
    pub video_width: Option<u32>,
    /// Video height in pixels.
    pub video_height: Option<u32>,
    /// Audio codec, if an audio stream exists.
    pub audio_codec: Option<String>,
}

/// One clip in the concatenation step, in timeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatClip {
    /// Source clip file.
    pub path: PathBuf,
    /// Clip duration in seconds, as measured at generation time.
    pub duration_secs: f64,
    /// Fade-in applied at the clip head, seconds (0 = none).
    pub fade_in_secs: f64,
    /// Fade-out applied at the clip tail, seconds (0 = none).
    pub fade_out_secs: f64,
}

/// Background track mixed under the narration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMix {
    /// Audio file; looped if shorter than the total, trimmed if longer.
    pub path: PathBuf,
    /// Gain applied to the track in dB (negative lowers it).
    pub gain_db: f64,
}

/// One narration utterance overlaid at a fixed offset.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationMix {
    /// Audio file.
    pub path: PathBuf,
    /// Absolute offset of the utterance in the final track, seconds.
    pub offset_secs: f64,
    /// Maximum length; the utterance is trimmed past this (scene-end clip).
    pub max_duration_secs: f64,
}

/// Full specification of the assembled audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMixSpec {
    /// Exact length of the output track in seconds.
    pub total_duration_secs: f64,
    /// Optional background track.
    pub background: Option<BackgroundMix>,
    /// Narration overlays, in offset order.
    pub narration: Vec<NarrationMix>,
}

/// Specification for a synthesized placeholder clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSpec {
    /// Text drawn centered on the clip.
    pub label: String,
    /// Clip duration in seconds.
    pub duration_secs: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: u32,
    /// Background color as an ffmpeg hex literal, e.g. "0x1e2430".
    pub color: String,
}

/// Result of a completed composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionOutput {
    /// The final muxed media file.
    pub output_path: PathBuf,
    /// Duration of the final file in seconds, when probing succeeded.
    pub duration_secs: Option<f64>,
    /// Subtitle sidecar, written when the plan had subtitle entries.
    pub subtitle_path: Option<PathBuf>,
    /// Timeline description sidecar for downstream inspection.
    pub timeline_path: Option<PathBuf>,
}
