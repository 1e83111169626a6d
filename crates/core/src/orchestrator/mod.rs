//! Scene orchestration.
//!
//! Fans out per-scene fallback coordinators under a concurrency cap,
//! preserves scene order in the collected results, supports cancellation
//! with preservation of completed scenes, and reports which scenes only
//! resolved via the placeholder fallback.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::SceneOrchestrator;
pub use types::{OrchestratorError, RunContext, RunReport};
