pub mod compositor;
pub mod config;
pub mod fallback;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod testing;
pub mod timeline;
pub mod tracker;

pub use compositor::{
    CompositionOutput, Compositor, CompositorConfig, CompositorError, FfmpegEngine, MediaEngine,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use fallback::{FallbackConfig, FallbackCoordinator, FallbackError, SceneResult};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, RunContext, RunReport, SceneOrchestrator,
};
pub use provider::{
    AspectRatio, GenerationRequest, PiapiConfig, PiapiProvider, PlaceholderConfig,
    PlaceholderProvider, ProviderAdapter, ProviderError, Transition, VeoConfig, VeoProvider,
};
pub use timeline::{CompositionPlan, NarrationClip, Timeline};
pub use tracker::{JobState, JobTracker, ProviderJob, TrackerError};
