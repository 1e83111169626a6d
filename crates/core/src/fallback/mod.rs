//! Per-scene provider fallback.
//!
//! The original integration code duplicated this logic once per provider
//! pairing; here it collapses into one coordinator parameterized by an
//! ordered [`ProviderAdapter`] list with the placeholder generator as the
//! guaranteed tail.
//!
//! [`ProviderAdapter`]: crate::provider::ProviderAdapter

mod config;
mod coordinator;
mod types;

pub use config::FallbackConfig;
pub use coordinator::FallbackCoordinator;
pub use types::{AttemptOutcome, AttemptRecord, FallbackError, SceneResult};
