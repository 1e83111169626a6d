//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Provider jobs (submissions, failures by kind, durations)
//! - Scene resolution (provider vs placeholder)
//! - Composition steps (durations)

use once_cell::sync::Lazy;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

/// Generation jobs submitted, by provider.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelforge_jobs_submitted_total",
            "Total generation jobs submitted",
        ),
        &["provider"],
    )
    .unwrap()
});

/// Generation job failures, by provider and failure kind.
pub static JOB_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelforge_job_failures_total",
            "Total generation job failures",
        ),
        &["provider", "kind"], // "rejected", "unavailable", "timed_out", "failed", ...
    )
    .unwrap()
});

/// Job wall-clock duration in seconds, by provider and outcome.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_job_duration_seconds",
            "Wall-clock duration of generation jobs",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["provider", "outcome"],
    )
    .unwrap()
});

/// Scenes resolved, by source ("provider" or "placeholder").
pub static SCENES_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_scenes_resolved_total", "Total scenes resolved"),
        &["source"],
    )
    .unwrap()
});

/// Scenes that fell back to the placeholder generator.
pub static PLACEHOLDER_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_placeholder_fallbacks_total",
        "Scenes where every real provider was exhausted",
    )
    .unwrap()
});

/// Composition step duration in seconds, by step.
pub static COMPOSE_STEP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_compose_step_duration_seconds",
            "Duration of composition pipeline steps",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["step"], // "concat", "audio", "mux"
    )
    .unwrap()
});

/// Registers all core metrics with a registry.
pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(JOBS_SUBMITTED.clone()))?;
    registry.register(Box::new(JOB_FAILURES.clone()))?;
    registry.register(Box::new(JOB_DURATION.clone()))?;
    registry.register(Box::new(SCENES_RESOLVED.clone()))?;
    registry.register(Box::new(PLACEHOLDER_FALLBACKS.clone()))?;
    registry.register(Box::new(COMPOSE_STEP_DURATION.clone()))?;
    Ok(())
}
