//! Scene orchestrator implementation.
//!
//! Fans out one fallback coordinator run per scene under a bounded worker
//! pool, collects results keyed by scene index, and reports them sorted by
//! scene index; clip arrival order never determines final video order.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::fallback::{FallbackCoordinator, FallbackError, SceneResult};
use crate::provider::{GenerationRequest, ProviderError};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, RunContext, RunReport};

/// The scene orchestrator - runs all scenes of a script to resolution.
pub struct SceneOrchestrator {
    config: OrchestratorConfig,
    coordinator: Arc<FallbackCoordinator>,
    shutdown_tx: broadcast::Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl SceneOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(config: OrchestratorConfig, coordinator: Arc<FallbackCoordinator>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            config,
            coordinator,
            shutdown_tx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels the current run. In-flight jobs receive a best-effort remote
    /// cancel; scenes that already resolved are preserved in the report.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Runs every request to a SceneResult.
    ///
    /// `prior` holds results from an earlier, interrupted run; their scenes
    /// are skipped entirely, so a resumed run never re-submits billable work
    /// for scenes that already succeeded.
    pub async fn run(
        &self,
        ctx: &RunContext,
        requests: &[GenerationRequest],
        prior: &[SceneResult],
    ) -> Result<RunReport, OrchestratorError> {
        let mut seen = HashSet::new();
        for req in requests {
            if !seen.insert(req.scene_index) {
                return Err(OrchestratorError::DuplicateSceneIndex(req.scene_index));
            }
        }

        self.cancelled.store(false, Ordering::SeqCst);

        tokio::fs::create_dir_all(ctx.clips_dir())
            .await
            .map_err(|e| OrchestratorError::WorkDir {
                path: ctx.clips_dir(),
                source: e,
            })?;

        let requested: HashSet<usize> = requests.iter().map(|r| r.scene_index).collect();
        let mut seeded: BTreeMap<usize, SceneResult> = BTreeMap::new();
        for result in prior {
            if requested.contains(&result.scene_index) {
                seeded.insert(result.scene_index, result.clone());
            }
        }
        let skipped = seeded.len();

        let results = Arc::new(Mutex::new(seeded));
        let placeholder_failure: Arc<Mutex<Option<(usize, ProviderError)>>> =
            Arc::new(Mutex::new(None));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs.max(1)));
        let mut workers = JoinSet::new();

        info!(
            run_id = %ctx.run_id,
            scenes = requests.len(),
            skipped,
            max_concurrent = self.config.max_concurrent_jobs,
            "starting scene orchestration"
        );

        for req in requests {
            if results.lock().await.contains_key(&req.scene_index) {
                debug!(scene = req.scene_index, "already resolved, skipping");
                continue;
            }

            let req = req.clone();
            let ctx = ctx.clone();
            let coordinator = Arc::clone(&self.coordinator);
            let results = Arc::clone(&results);
            let placeholder_failure = Arc::clone(&placeholder_failure);
            let semaphore = Arc::clone(&semaphore);
            let shutdown_tx = self.shutdown_tx.clone();
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            workers.spawn(async move {
                // A scene queued behind the concurrency cap can still be
                // cancelled before it starts.
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                    _ = shutdown_rx.recv() => {
                        debug!(scene = req.scene_index, "cancelled while queued");
                        return;
                    }
                };
                let _permit = permit;

                match coordinator.resolve(&ctx, &req, &mut shutdown_rx).await {
                    Ok(result) => {
                        // Each scene index is owned by exactly one worker,
                        // so this is the only write for this key.
                        results.lock().await.insert(req.scene_index, result);
                    }
                    Err(FallbackError::Cancelled) => {
                        debug!(scene = req.scene_index, "scene cancelled in flight");
                    }
                    Err(FallbackError::PlaceholderFailed {
                        scene_index,
                        source,
                    }) => {
                        let mut slot = placeholder_failure.lock().await;
                        if slot.is_none() {
                            *slot = Some((scene_index, source));
                        }
                        // The environment cannot synthesize clips; stop the
                        // remaining workers too.
                        let _ = shutdown_tx.send(());
                    }
                }
            });
        }

        let watchdog = if self.config.run_deadline_secs > 0 {
            let deadline = Duration::from_secs(self.config.run_deadline_secs);
            let shutdown_tx = self.shutdown_tx.clone();
            let cancelled = Arc::clone(&self.cancelled);
            Some(tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!("run deadline reached, cancelling remaining scenes");
                cancelled.store(true, Ordering::SeqCst);
                let _ = shutdown_tx.send(());
            }))
        } else {
            None
        };

        while workers.join_next().await.is_some() {}
        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        if let Some((scene_index, source)) = placeholder_failure.lock().await.take() {
            return Err(OrchestratorError::PlaceholderFailure {
                scene_index,
                source,
            });
        }

        let collected = results.lock().await;
        let results: Vec<SceneResult> = collected.values().cloned().collect();
        drop(collected);

        let placeholder_scenes: Vec<usize> = results
            .iter()
            .filter(|r| r.used_fallback)
            .map(|r| r.scene_index)
            .collect();
        let cancelled = self.cancelled.load(Ordering::SeqCst);

        if !placeholder_scenes.is_empty() {
            warn!(
                scenes = ?placeholder_scenes,
                "some scenes resolved via placeholder only"
            );
        }
        info!(
            run_id = %ctx.run_id,
            resolved = results.len(),
            requested = requests.len(),
            cancelled,
            "scene orchestration finished"
        );

        Ok(RunReport {
            results,
            placeholder_scenes,
            cancelled,
        })
    }
}
