//! Job tracker implementation.
//!
//! Drives one generation request against one provider to a terminal state:
//! submission, fixed-interval polling, wall-clock deadline, best-effort
//! remote cancel on timeout and on caller cancellation.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::metrics;
use crate::provider::{GenerationRequest, PollStatus, ProviderAdapter, ProviderError};

use super::types::{JobState, ProviderJob, TrackerError};

/// Consecutive poll transport failures tolerated before giving up on a job.
const MAX_POLL_FAILURES: u32 = 3;

/// Tracks a single generation job on one provider.
pub struct JobTracker {
    provider: Arc<dyn ProviderAdapter>,
}

impl JobTracker {
    /// Creates a tracker for the given provider.
    pub fn new(provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { provider }
    }

    /// Runs one request to a terminal state.
    ///
    /// Returns `Ok` with the job in Succeeded, Failed or TimedOut state;
    /// `Err(Provider)` when submission failed or polling broke down (so the
    /// caller can classify retryability); `Err(Cancelled)` when the shutdown
    /// signal fired, after a best-effort remote cancel.
    pub async fn run(
        &self,
        req: &GenerationRequest,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<ProviderJob, TrackerError> {
        let provider_name = self.provider.name().to_string();
        let started = Instant::now();

        let ack = self.provider.submit(req).await.inspect_err(|e| {
            metrics::JOB_FAILURES
                .with_label_values(&[&provider_name, error_kind(e)])
                .inc();
        })?;

        metrics::JOBS_SUBMITTED.with_label_values(&[&provider_name]).inc();

        let mut job = ProviderJob {
            provider: provider_name.clone(),
            job_id: ack.job_id.clone(),
            submitted_at: Utc::now(),
            state: JobState::Submitted,
            result_url: None,
            error: None,
        };

        // Synchronous providers return the result with the submission.
        if let Some(inline) = ack.inline_result {
            job.state = JobState::Succeeded;
            job.result_url = Some(inline);
            metrics::JOB_DURATION
                .with_label_values(&[&provider_name, "succeeded"])
                .observe(started.elapsed().as_secs_f64());
            return Ok(job);
        }

        job.state = JobState::Processing;
        let deadline = self.provider.deadline();
        let poll_interval = self.provider.poll_interval();
        let mut poll_failures = 0u32;

        loop {
            if started.elapsed() >= deadline {
                warn!(
                    provider = %provider_name,
                    job_id = %job.job_id,
                    scene = req.scene_index,
                    "job deadline exceeded, cancelling"
                );
                self.cancel_best_effort(&job.job_id).await;
                job.state = JobState::TimedOut;
                job.error = Some(format!(
                    "deadline of {}s exceeded",
                    deadline.as_secs()
                ));
                metrics::JOB_FAILURES
                    .with_label_values(&[&provider_name, "timed_out"])
                    .inc();
                metrics::JOB_DURATION
                    .with_label_values(&[&provider_name, "timed_out"])
                    .observe(started.elapsed().as_secs_f64());
                return Ok(job);
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(provider = %provider_name, job_id = %job.job_id, "cancellation requested");
                    self.cancel_best_effort(&job.job_id).await;
                    return Err(TrackerError::Cancelled);
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }

            match self.provider.poll(&job.job_id).await {
                Ok(PollStatus::Queued) => {
                    poll_failures = 0;
                }
                Ok(PollStatus::Processing) => {
                    poll_failures = 0;
                }
                Ok(PollStatus::Completed { media_url }) => {
                    job.state = JobState::Succeeded;
                    job.result_url = Some(media_url);
                    metrics::JOB_DURATION
                        .with_label_values(&[&provider_name, "succeeded"])
                        .observe(started.elapsed().as_secs_f64());
                    return Ok(job);
                }
                Ok(PollStatus::Failed { reason }) => {
                    job.state = JobState::Failed;
                    job.error = Some(reason);
                    metrics::JOB_FAILURES
                        .with_label_values(&[&provider_name, "failed"])
                        .inc();
                    metrics::JOB_DURATION
                        .with_label_values(&[&provider_name, "failed"])
                        .observe(started.elapsed().as_secs_f64());
                    return Ok(job);
                }
                Err(e) => {
                    poll_failures += 1;
                    if e.is_retryable() && poll_failures < MAX_POLL_FAILURES {
                        debug!(
                            provider = %provider_name,
                            job_id = %job.job_id,
                            failures = poll_failures,
                            "transient poll error: {}", e
                        );
                        continue;
                    }
                    warn!(
                        provider = %provider_name,
                        job_id = %job.job_id,
                        "polling broke down after {} failures: {}",
                        poll_failures, e
                    );
                    self.cancel_best_effort(&job.job_id).await;
                    metrics::JOB_FAILURES
                        .with_label_values(&[&provider_name, error_kind(&e)])
                        .inc();
                    return Err(TrackerError::Provider(e));
                }
            }
        }
    }

    /// Cancels the remote job, swallowing errors.
    async fn cancel_best_effort(&self, job_id: &str) {
        if let Err(e) = self.provider.cancel(job_id).await {
            debug!(
                provider = %self.provider.name(),
                job_id,
                "best-effort cancel failed: {}", e
            );
        }
    }
}

/// Metric label for a provider error.
fn error_kind(e: &ProviderError) -> &'static str {
    match e {
        ProviderError::Rejected { .. } => "rejected",
        ProviderError::Unavailable { .. } => "unavailable",
        ProviderError::JobNotFound { .. } => "not_found",
        ProviderError::MalformedResponse { .. } => "malformed",
        ProviderError::Io(_) => "io",
    }
}
