//! Types for the generation provider system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target aspect ratio for generated clips.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AspectRatio {
    /// 16:9 landscape (1920x1080).
    #[default]
    #[serde(rename = "16:9")]
    Wide,
    /// 9:16 portrait (1080x1920).
    #[serde(rename = "9:16")]
    Tall,
    /// 1:1 square (1080x1080).
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Pixel resolution for this aspect ratio.
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Self::Wide => (1920, 1080),
            Self::Tall => (1080, 1920),
            Self::Square => (1080, 1080),
        }
    }

    /// Resolution formatted as "WIDTHxHEIGHT" for provider payloads.
    pub fn resolution_str(&self) -> String {
        let (w, h) = self.resolution();
        format!("{}x{}", w, h)
    }
}

/// Scene-to-clip transition requested by the script.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Hard cut, no effect at the boundary.
    #[default]
    Cut,
    /// Fade through black at the boundary.
    Fade,
    /// Treated as a boundary fade; a true overlapping crossfade would
    /// shorten the video track relative to the audio track.
    Crossfade,
}

impl Transition {
    /// Whether this transition requests an effect at the clip boundary.
    pub fn is_cut(&self) -> bool {
        matches!(self, Self::Cut)
    }
}

/// A request to generate one scene clip.
///
/// Immutable once created; one request produces exactly one [`SceneResult`]
/// through the fallback coordinator, possibly after several provider
/// attempts.
///
/// [`SceneResult`]: crate::fallback::SceneResult
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Position of the scene in the final video. Unique per run.
    pub scene_index: usize,
    /// Text prompt describing the clip.
    pub prompt: String,
    /// Requested clip duration in seconds.
    pub duration_secs: f64,
    /// Target aspect ratio.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Opaque character-consistency token understood by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_reference: Option<String>,
    /// Mood tag from the script stage; used only for placeholder labeling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Requested transition treatment at this clip's boundaries. A boundary
    /// fades only when both adjacent clips request a non-cut transition.
    #[serde(default)]
    pub transition: Transition,
}

/// Acknowledgement of a submitted generation job.
#[derive(Debug, Clone)]
pub struct SubmitAck {
    /// Opaque provider-side job identifier.
    pub job_id: String,
    /// Result reference returned inline by synchronous providers. When
    /// present the job is already complete and never needs polling.
    pub inline_result: Option<String>,
}

impl SubmitAck {
    /// Ack for an asynchronous job that must be polled.
    pub fn queued(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            inline_result: None,
        }
    }

    /// Ack for a synchronous provider that returned the result inline.
    pub fn completed(job_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            inline_result: Some(result.into()),
        }
    }
}

/// Status reported by a provider for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Job accepted, not yet started.
    Queued,
    /// Generation in progress.
    Processing,
    /// Generation finished; the media can be retrieved.
    Completed { media_url: String },
    /// Provider reported a terminal failure.
    Failed { reason: String },
}

/// Errors surfaced by provider adapters.
///
/// `Rejected` and `Unavailable` carry the retry semantics the fallback
/// coordinator relies on: a rejected request is never retried on the same
/// provider, an unavailable provider is retried a bounded number of times.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request (bad prompt/params/auth). Not
    /// retryable on the same provider.
    #[error("provider rejected request: {reason}")]
    Rejected { reason: String },

    /// The provider could not be reached or returned a transient error
    /// (network failure, 429, 5xx). Retryable.
    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String },

    /// The provider no longer knows the job id.
    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// The provider answered with something we could not interpret.
    #[error("malformed provider response: {reason}")]
    MalformedResponse { reason: String },

    /// Local I/O failure while writing a downloaded result.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Creates a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same provider makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_resolutions() {
        assert_eq!(AspectRatio::Wide.resolution(), (1920, 1080));
        assert_eq!(AspectRatio::Tall.resolution(), (1080, 1920));
        assert_eq!(AspectRatio::Square.resolution(), (1080, 1080));
        assert_eq!(AspectRatio::Wide.resolution_str(), "1920x1080");
    }

    #[test]
    fn test_aspect_ratio_serde_names() {
        let json = serde_json::to_string(&AspectRatio::Tall).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"1:1\"").unwrap();
        assert_eq!(parsed, AspectRatio::Square);
    }

    #[test]
    fn test_transition_default_is_cut() {
        assert_eq!(Transition::default(), Transition::Cut);
        assert!(Transition::Cut.is_cut());
        assert!(!Transition::Fade.is_cut());
        assert!(!Transition::Crossfade.is_cut());
    }

    #[test]
    fn test_generation_request_deserialize_minimal() {
        let json = r#"{
            "scene_index": 2,
            "prompt": "city at dusk",
            "duration_secs": 8.0
        }"#;
        let req: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.scene_index, 2);
        assert_eq!(req.aspect_ratio, AspectRatio::Wide);
        assert_eq!(req.transition, Transition::Cut);
        assert!(req.character_reference.is_none());
    }

    #[test]
    fn test_submit_ack_constructors() {
        let queued = SubmitAck::queued("job-1");
        assert_eq!(queued.job_id, "job-1");
        assert!(queued.inline_result.is_none());

        let inline = SubmitAck::completed("job-2", "https://cdn.example/clip.mp4");
        assert_eq!(
            inline.inline_result.as_deref(),
            Some("https://cdn.example/clip.mp4")
        );
    }

    #[test]
    fn test_error_retryability() {
        assert!(ProviderError::unavailable("503").is_retryable());
        assert!(!ProviderError::rejected("bad prompt").is_retryable());
        assert!(!ProviderError::malformed("no task_id").is_retryable());
        assert!(!ProviderError::JobNotFound {
            job_id: "x".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::rejected("prompt empty");
        assert_eq!(err.to_string(), "provider rejected request: prompt empty");

        let err = ProviderError::unavailable("connection refused");
        assert_eq!(err.to_string(), "provider unavailable: connection refused");
    }
}
