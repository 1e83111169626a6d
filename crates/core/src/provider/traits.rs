//! Trait definition for generation providers.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::types::{GenerationRequest, PollStatus, ProviderError, SubmitAck};

/// An external generative-media service reachable through an asynchronous
/// job-submission/polling API.
///
/// Implementations must be safe for concurrent use across different job ids.
/// `poll` must be idempotent and free of side effects beyond the query
/// itself.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Name of this provider, used in results, logs and metrics.
    fn name(&self) -> &str;

    /// Submits a generation job. Synchronous providers return the result
    /// inline through [`SubmitAck::inline_result`].
    async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError>;

    /// Queries the status of a previously submitted job.
    async fn poll(&self, job_id: &str) -> Result<PollStatus, ProviderError>;

    /// Cancels a job. Best effort; callers ignore errors.
    async fn cancel(&self, job_id: &str) -> Result<(), ProviderError>;

    /// Retrieves a completed result to a local file. `source` is whatever
    /// reference the provider returned (URL for remote providers, path for
    /// local ones).
    async fn download(&self, source: &str, dest: &Path) -> Result<(), ProviderError>;

    /// Fixed polling interval for this provider.
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Wall-clock deadline after which a job is forced to time out.
    fn deadline(&self) -> Duration {
        Duration::from_secs(300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct StaticProvider;

    #[async_trait]
    impl ProviderAdapter for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError> {
            Ok(SubmitAck::completed(
                format!("job-{}", req.scene_index),
                "/tmp/clip.mp4",
            ))
        }

        async fn poll(&self, _job_id: &str) -> Result<PollStatus, ProviderError> {
            Ok(PollStatus::Completed {
                media_url: "/tmp/clip.mp4".to_string(),
            })
        }

        async fn cancel(&self, _job_id: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn download(&self, _source: &str, _dest: &Path) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_timing() {
        let provider = StaticProvider;
        assert_eq!(provider.poll_interval(), Duration::from_secs(5));
        assert_eq!(provider.deadline(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_trait_object_usage() {
        let provider: Box<dyn ProviderAdapter> = Box::new(StaticProvider);
        let req = GenerationRequest {
            scene_index: 0,
            prompt: "test".to_string(),
            duration_secs: 8.0,
            aspect_ratio: Default::default(),
            character_reference: None,
            mood: None,
            transition: Default::default(),
        };
        let ack = provider.submit(&req).await.unwrap();
        assert_eq!(ack.job_id, "job-0");
        assert!(ack.inline_result.is_some());
        provider
            .download("/tmp/clip.mp4", &PathBuf::from("/tmp/out.mp4"))
            .await
            .unwrap();
    }
}
