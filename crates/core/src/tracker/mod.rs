//! Job lifecycle tracking.
//!
//! A [`JobTracker`] owns the lifecycle of a single generation request on a
//! single provider: submission, fixed-interval polling, wall-clock deadline,
//! result retrieval, and best-effort remote cancellation. Which provider is
//! used is the fallback coordinator's concern.

mod runner;
mod types;

pub use runner::JobTracker;
pub use types::{JobState, ProviderJob, TrackerError};
