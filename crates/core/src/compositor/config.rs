//! Configuration for the compositor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based compositor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Temporary directory for intermediate video/audio files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Timeout for a single composition step in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Gain applied to the background track in dB.
    #[serde(default = "default_background_gain")]
    pub background_gain_db: f64,

    /// Total length of a boundary fade between two clips, seconds. Clamped
    /// to one second; half is carved from each adjacent clip.
    #[serde(default = "default_transition")]
    pub transition_secs: f64,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// x264 CRF used when re-encoding (concat and subtitle burn-in).
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// FFmpeg log level (quiet, error, warning, info, ...).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("reelforge-compositor")
}

fn default_timeout() -> u64 {
    600
}

fn default_background_gain() -> f64 {
    -10.0
}

fn default_transition() -> f64 {
    1.0
}

fn default_fps() -> u32 {
    30
}

fn default_crf() -> u32 {
    23
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout(),
            background_gain_db: default_background_gain(),
            transition_secs: default_transition(),
            fps: default_fps(),
            crf: default_crf(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl CompositorConfig {
    /// Creates a config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Sets the per-step timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
