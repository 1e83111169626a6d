//! Mock provider adapter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{
    GenerationRequest, PollStatus, ProviderAdapter, ProviderError, SubmitAck,
};

/// Scripted behavior for one submission.
#[derive(Debug, Clone)]
enum MockJob {
    /// Submission succeeds; the job completes after this many polls.
    Success { polls_until_done: u32 },
    /// Submission returns the result inline (synchronous provider).
    InlineSuccess,
    /// Submission is rejected outright.
    SubmitRejected(String),
    /// Submission fails with a transient error.
    SubmitUnavailable(String),
    /// Submission succeeds; the job then reports a terminal failure.
    JobFailure(String),
    /// Submission succeeds; the job never leaves the processing state.
    NeverFinish,
}

#[derive(Debug)]
struct ActiveJob {
    polls_remaining: u32,
    outcome: JobOutcome,
}

#[derive(Debug)]
enum JobOutcome {
    Succeed,
    Fail(String),
    Never,
}

#[derive(Debug, Default)]
struct Inner {
    script: VecDeque<MockJob>,
    jobs: HashMap<String, ActiveJob>,
    submissions: Vec<GenerationRequest>,
    cancels: Vec<String>,
    downloads: Vec<(String, PathBuf)>,
    polls: u64,
    job_seq: u64,
}

/// Mock implementation of the ProviderAdapter trait.
///
/// Provides controllable behavior for testing:
/// - Script submit/poll outcomes per submission, consumed in order
/// - Track submissions, cancels and downloads for assertions
/// - Fast polling and a configurable deadline
///
/// Submissions beyond the script succeed immediately. Clones share state.
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockProvider::new("mock");
/// provider.enqueue_unavailable("503").await;
/// provider.enqueue_success(2).await;
///
/// // First submit fails transiently, the retry completes after two polls.
/// assert_eq!(provider.submission_count().await, 2);
/// ```
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    poll_interval: Duration,
    deadline: Duration,
    inner: Arc<RwLock<Inner>>,
}

impl MockProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            poll_interval: Duration::from_millis(10),
            deadline: Duration::from_secs(5),
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Override the job deadline (for timeout tests).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Queue a submission that completes after `polls_until_done` polls.
    pub async fn enqueue_success(&self, polls_until_done: u32) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::Success { polls_until_done });
    }

    /// Queue a submission that returns its result inline.
    pub async fn enqueue_inline_success(&self) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::InlineSuccess);
    }

    /// Queue a rejected submission.
    pub async fn enqueue_rejected(&self, reason: impl Into<String>) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::SubmitRejected(reason.into()));
    }

    /// Queue a transiently failing submission.
    pub async fn enqueue_unavailable(&self, reason: impl Into<String>) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::SubmitUnavailable(reason.into()));
    }

    /// Queue a submission whose job fails terminally.
    pub async fn enqueue_job_failure(&self, reason: impl Into<String>) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::JobFailure(reason.into()));
    }

    /// Queue a submission whose job never finishes.
    pub async fn enqueue_never_finish(&self) {
        self.inner
            .write()
            .await
            .script
            .push_back(MockJob::NeverFinish);
    }

    /// Number of submissions made so far.
    pub async fn submission_count(&self) -> usize {
        self.inner.read().await.submissions.len()
    }

    /// All recorded submissions.
    pub async fn recorded_submissions(&self) -> Vec<GenerationRequest> {
        self.inner.read().await.submissions.clone()
    }

    /// All recorded cancel calls.
    pub async fn recorded_cancels(&self) -> Vec<String> {
        self.inner.read().await.cancels.clone()
    }

    /// All recorded downloads as (source, dest) pairs.
    pub async fn recorded_downloads(&self) -> Vec<(String, PathBuf)> {
        self.inner.read().await.downloads.clone()
    }

    /// Number of poll calls made so far.
    pub async fn poll_count(&self) -> u64 {
        self.inner.read().await.polls
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, req: &GenerationRequest) -> Result<SubmitAck, ProviderError> {
        let mut inner = self.inner.write().await;
        inner.submissions.push(req.clone());

        let behavior = inner
            .script
            .pop_front()
            .unwrap_or(MockJob::Success { polls_until_done: 0 });

        inner.job_seq += 1;
        let job_id = format!("{}-job-{}", self.name, inner.job_seq);

        match behavior {
            MockJob::SubmitRejected(reason) => Err(ProviderError::rejected(reason)),
            MockJob::SubmitUnavailable(reason) => Err(ProviderError::unavailable(reason)),
            MockJob::InlineSuccess => {
                let url = format!("mock://{}/{}", self.name, job_id);
                Ok(SubmitAck::completed(job_id, url))
            }
            MockJob::Success { polls_until_done } => {
                inner.jobs.insert(
                    job_id.clone(),
                    ActiveJob {
                        polls_remaining: polls_until_done,
                        outcome: JobOutcome::Succeed,
                    },
                );
                Ok(SubmitAck::queued(job_id))
            }
            MockJob::JobFailure(reason) => {
                inner.jobs.insert(
                    job_id.clone(),
                    ActiveJob {
                        polls_remaining: 0,
                        outcome: JobOutcome::Fail(reason),
                    },
                );
                Ok(SubmitAck::queued(job_id))
            }
            MockJob::NeverFinish => {
                inner.jobs.insert(
                    job_id.clone(),
                    ActiveJob {
                        polls_remaining: 0,
                        outcome: JobOutcome::Never,
                    },
                );
                Ok(SubmitAck::queued(job_id))
            }
        }
    }

    async fn poll(&self, job_id: &str) -> Result<PollStatus, ProviderError> {
        let mut inner = self.inner.write().await;
        inner.polls += 1;

        let Some(job) = inner.jobs.get_mut(job_id) else {
            return Err(ProviderError::JobNotFound {
                job_id: job_id.to_string(),
            });
        };

        match &job.outcome {
            JobOutcome::Never => Ok(PollStatus::Processing),
            _ if job.polls_remaining > 0 => {
                job.polls_remaining -= 1;
                Ok(PollStatus::Processing)
            }
            JobOutcome::Succeed => Ok(PollStatus::Completed {
                media_url: format!("mock://{}/{}", self.name, job_id),
            }),
            JobOutcome::Fail(reason) => Ok(PollStatus::Failed {
                reason: reason.clone(),
            }),
        }
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ProviderError> {
        self.inner.write().await.cancels.push(job_id.to_string());
        Ok(())
    }

    async fn download(&self, source: &str, dest: &Path) -> Result<(), ProviderError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, b"mock clip data").await?;
        self.inner
            .write()
            .await
            .downloads
            .push((source.to_string(), dest.to_path_buf()));
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            scene_index: 0,
            prompt: "test".to_string(),
            duration_secs: 8.0,
            aspect_ratio: Default::default(),
            character_reference: None,
            mood: None,
            transition: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_scripted_outcomes_consumed_in_order() {
        let provider = MockProvider::new("m");
        provider.enqueue_rejected("first").await;
        provider.enqueue_success(0).await;

        let err = provider.submit(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected { .. }));

        let ack = provider.submit(&request()).await.unwrap();
        assert!(ack.inline_result.is_none());
        assert_eq!(provider.submission_count().await, 2);
    }

    #[tokio::test]
    async fn test_poll_counts_down_to_completion() {
        let provider = MockProvider::new("m");
        provider.enqueue_success(2).await;

        let ack = provider.submit(&request()).await.unwrap();
        assert_eq!(provider.poll(&ack.job_id).await.unwrap(), PollStatus::Processing);
        assert_eq!(provider.poll(&ack.job_id).await.unwrap(), PollStatus::Processing);
        assert!(matches!(
            provider.poll(&ack.job_id).await.unwrap(),
            PollStatus::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let provider = MockProvider::new("m");
        let err = provider.poll("nope").await.unwrap_err();
        assert!(matches!(err, ProviderError::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_download_writes_stub_file() {
        let provider = MockProvider::new("m");
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("nested").join("clip.mp4");

        provider.download("mock://m/x", &dest).await.unwrap();
        assert!(dest.exists());
        assert_eq!(provider.recorded_downloads().await.len(), 1);
    }
}
