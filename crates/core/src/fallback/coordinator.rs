//! Fallback coordinator implementation.
//!
//! Drives one scene through an ordered provider preference list: first
//! provider to succeed wins and the rest are never touched; transient
//! failures get a bounded number of same-provider retries; when every real
//! provider is exhausted the local placeholder generator resolves the scene.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::compositor::MediaEngine;
use crate::metrics;
use crate::orchestrator::RunContext;
use crate::provider::{GenerationRequest, ProviderAdapter, ProviderError};
use crate::tracker::{JobState, JobTracker, ProviderJob, TrackerError};

use super::config::FallbackConfig;
use super::types::{AttemptOutcome, AttemptRecord, FallbackError, SceneResult};

/// What one provider attempt concluded.
enum AttemptVerdict {
    /// The scene is resolved.
    Done(SceneResult),
    /// Retry the same provider.
    Retry,
    /// Move on to the next provider.
    Advance,
}

/// Coordinates provider fallback for single scenes.
pub struct FallbackCoordinator {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    placeholder: Arc<dyn ProviderAdapter>,
    engine: Arc<dyn MediaEngine>,
    config: FallbackConfig,
}

impl FallbackCoordinator {
    /// Creates a coordinator over an ordered provider list. `providers` may
    /// be empty, in which case every scene resolves via the placeholder.
    pub fn new(
        config: FallbackConfig,
        providers: Vec<Arc<dyn ProviderAdapter>>,
        placeholder: Arc<dyn ProviderAdapter>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            providers,
            placeholder,
            engine,
            config,
        }
    }

    /// Resolves one scene to a clip. Always returns a SceneResult unless the
    /// caller cancels or the placeholder itself cannot run.
    pub async fn resolve(
        &self,
        ctx: &RunContext,
        req: &GenerationRequest,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<SceneResult, FallbackError> {
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for provider in &self.providers {
            let mut tries = 0u32;
            loop {
                match self
                    .try_provider(ctx, req, Arc::clone(provider), &mut attempts, shutdown, false)
                    .await?
                {
                    AttemptVerdict::Done(result) => return Ok(result),
                    AttemptVerdict::Advance => break,
                    AttemptVerdict::Retry => {
                        tries += 1;
                        if tries > self.config.max_retries_per_provider {
                            debug!(
                                provider = provider.name(),
                                scene = req.scene_index,
                                "retry budget exhausted, advancing"
                            );
                            break;
                        }
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms))
                            .await;
                    }
                }
            }
        }

        warn!(
            scene = req.scene_index,
            attempts = attempts.len(),
            "all providers exhausted, falling back to placeholder"
        );
        metrics::PLACEHOLDER_FALLBACKS.inc();

        match self
            .try_provider(
                ctx,
                req,
                Arc::clone(&self.placeholder),
                &mut attempts,
                shutdown,
                true,
            )
            .await?
        {
            AttemptVerdict::Done(result) => Ok(result),
            AttemptVerdict::Retry | AttemptVerdict::Advance => {
                let error = attempts
                    .last()
                    .and_then(|a| a.error.clone())
                    .unwrap_or_else(|| "placeholder generation failed".to_string());
                Err(FallbackError::PlaceholderFailed {
                    scene_index: req.scene_index,
                    source: ProviderError::unavailable(error),
                })
            }
        }
    }

    /// Runs one tracker attempt against one provider and classifies the
    /// outcome.
    async fn try_provider(
        &self,
        ctx: &RunContext,
        req: &GenerationRequest,
        provider: Arc<dyn ProviderAdapter>,
        attempts: &mut Vec<AttemptRecord>,
        shutdown: &mut broadcast::Receiver<()>,
        is_placeholder: bool,
    ) -> Result<AttemptVerdict, FallbackError> {
        let provider_name = provider.name().to_string();
        let tracker = JobTracker::new(Arc::clone(&provider));

        let job = match tracker.run(req, shutdown).await {
            Ok(job) => job,
            Err(TrackerError::Cancelled) => return Err(FallbackError::Cancelled),
            Err(TrackerError::Provider(e)) => {
                let (outcome, retry) = match &e {
                    ProviderError::Rejected { .. } => (AttemptOutcome::Rejected, false),
                    _ => (AttemptOutcome::Unavailable, e.is_retryable()),
                };
                attempts.push(AttemptRecord {
                    provider: provider_name.clone(),
                    job_id: None,
                    outcome,
                    error: Some(e.to_string()),
                });
                debug!(
                    provider = %provider_name,
                    scene = req.scene_index,
                    retryable = retry,
                    "provider attempt failed: {}", e
                );
                return Ok(if retry {
                    AttemptVerdict::Retry
                } else {
                    AttemptVerdict::Advance
                });
            }
        };

        match job.state {
            JobState::Succeeded => {
                match self
                    .collect_result(ctx, req, &job, &provider, is_placeholder)
                    .await
                {
                    Ok(mut result) => {
                        attempts.push(AttemptRecord {
                            provider: provider_name.clone(),
                            job_id: Some(job.job_id.clone()),
                            outcome: AttemptOutcome::Succeeded,
                            error: None,
                        });
                        result.attempts = attempts.clone();
                        metrics::SCENES_RESOLVED
                            .with_label_values(&[if is_placeholder {
                                "placeholder"
                            } else {
                                "provider"
                            }])
                            .inc();
                        info!(
                            provider = %provider_name,
                            scene = req.scene_index,
                            clip = %result.clip_path.display(),
                            "scene resolved"
                        );
                        Ok(AttemptVerdict::Done(result))
                    }
                    Err(e) => {
                        // The generation succeeded but the result could not
                        // be retrieved; treat like a transient provider
                        // failure.
                        attempts.push(AttemptRecord {
                            provider: provider_name.clone(),
                            job_id: Some(job.job_id.clone()),
                            outcome: AttemptOutcome::Unavailable,
                            error: Some(format!("result retrieval failed: {}", e)),
                        });
                        warn!(
                            provider = %provider_name,
                            scene = req.scene_index,
                            "failed to retrieve result: {}", e
                        );
                        Ok(AttemptVerdict::Retry)
                    }
                }
            }
            JobState::Failed => {
                attempts.push(attempt_from_job(&provider_name, &job, AttemptOutcome::Failed));
                Ok(AttemptVerdict::Advance)
            }
            JobState::TimedOut => {
                attempts.push(attempt_from_job(
                    &provider_name,
                    &job,
                    AttemptOutcome::TimedOut,
                ));
                Ok(AttemptVerdict::Retry)
            }
            JobState::Submitted | JobState::Processing => {
                // The tracker only returns terminal jobs; treat anything
                // else as a transient fault.
                attempts.push(attempt_from_job(
                    &provider_name,
                    &job,
                    AttemptOutcome::Unavailable,
                ));
                Ok(AttemptVerdict::Retry)
            }
        }
    }

    /// Downloads the job result into the run's clip directory and measures
    /// its real duration.
    async fn collect_result(
        &self,
        ctx: &RunContext,
        req: &GenerationRequest,
        job: &ProviderJob,
        provider: &Arc<dyn ProviderAdapter>,
        is_placeholder: bool,
    ) -> Result<SceneResult, ProviderError> {
        let source = job
            .result_url
            .as_deref()
            .ok_or_else(|| ProviderError::malformed("succeeded job has no result reference"))?;

        let dest = ctx.clip_path(req.scene_index);
        provider.download(source, &dest).await?;

        let duration_secs = match self.engine.probe(&dest).await {
            Ok(info) if info.duration_secs > 0.0 => info.duration_secs,
            _ => req.duration_secs,
        };

        Ok(SceneResult {
            scene_index: req.scene_index,
            provider: job.provider.clone(),
            clip_path: dest,
            duration_secs,
            used_fallback: is_placeholder,
            transition: req.transition,
            attempts: Vec::new(),
        })
    }
}

fn attempt_from_job(provider: &str, job: &ProviderJob, outcome: AttemptOutcome) -> AttemptRecord {
    AttemptRecord {
        provider: provider.to_string(),
        job_id: Some(job.job_id.clone()),
        outcome,
        error: job.error.clone(),
    }
}
