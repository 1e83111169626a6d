//! Error types for the compositor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while composing the final video.
#[derive(Debug, Error)]
pub enum CompositorError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// An input file referenced by the plan does not exist.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The timeline has no video entries to compose.
    #[error("timeline has no video entries")]
    EmptyTimeline,

    /// A composition step's subprocess failed.
    #[error("{step} step failed: {reason}")]
    StepFailed {
        step: &'static str,
        reason: String,
        stderr: Option<String>,
    },

    /// A composition step exceeded its time budget.
    #[error("{step} step timed out after {timeout_secs} seconds")]
    Timeout {
        step: &'static str,
        timeout_secs: u64,
    },

    /// Failed to probe a media file.
    #[error("failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while staging or cleaning up files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompositorError {
    /// Creates a step failure with captured stderr.
    pub fn step_failed(
        step: &'static str,
        reason: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::StepFailed {
            step,
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a probe failure.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failed_display() {
        let err = CompositorError::step_failed("mux", "exit code 1", None);
        assert_eq!(err.to_string(), "mux step failed: exit code 1");
    }

    #[test]
    fn test_timeout_display() {
        let err = CompositorError::Timeout {
            step: "concat",
            timeout_secs: 600,
        };
        assert_eq!(err.to_string(), "concat step timed out after 600 seconds");
    }
}
