use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::compositor::CompositorConfig;
use crate::fallback::FallbackConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::provider::{PiapiConfig, PlaceholderConfig, VeoConfig};

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Run directories.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Provider credentials and preference order.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Per-scene fallback behavior.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Concurrency and run deadline.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// FFmpeg paths and composition parameters.
    #[serde(default)]
    pub compositor: CompositorConfig,
}

/// Directories used by a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory for per-run working files (clips, intermediates).
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("reelforge-work")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
        }
    }
}

/// Configured providers and the order in which the coordinator tries them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Ordered provider preference, e.g. `["piapi/hailuo-02", "veo"]`.
    /// Names must match configured providers. An empty list means every
    /// scene resolves via the placeholder.
    #[serde(default)]
    pub preference: Vec<String>,

    /// PiAPI-hosted models, one entry per model.
    #[serde(default)]
    pub piapi: Vec<PiapiConfig>,

    /// Veo-style endpoint.
    #[serde(default)]
    pub veo: Option<VeoConfig>,

    /// Local placeholder generator.
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

impl ProvidersConfig {
    /// Whether `name` refers to a configured provider.
    pub fn resolves(&self, name: &str) -> bool {
        if name == "veo" {
            return self.veo.is_some();
        }
        if let Some(model) = name.strip_prefix("piapi/") {
            return self.piapi.iter().any(|p| p.model == model);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.work_dir, PathBuf::from("reelforge-work"));
        assert!(config.providers.preference.is_empty());
        assert!(config.providers.piapi.is_empty());
        assert!(config.providers.veo.is_none());
    }

    #[test]
    fn test_resolves_provider_names() {
        let mut providers = ProvidersConfig::default();
        providers.piapi.push(PiapiConfig::new("key", "hailuo-02"));
        providers.veo = Some(VeoConfig::new("token"));

        assert!(providers.resolves("piapi/hailuo-02"));
        assert!(providers.resolves("veo"));
        assert!(!providers.resolves("piapi/kling"));
        assert!(!providers.resolves("sora"));
    }

    #[test]
    fn test_deserialize_full_document() {
        let toml = r#"
            [pipeline]
            work_dir = "/var/lib/reelforge"

            [providers]
            preference = ["piapi/hailuo-02", "veo"]

            [[providers.piapi]]
            api_key = "pk"
            model = "hailuo-02"
            poll_interval_secs = 5
            timeout_secs = 300

            [providers.veo]
            api_key = "vk"
            poll_interval_secs = 3
            timeout_secs = 600

            [orchestrator]
            max_concurrent_jobs = 4

            [compositor]
            background_gain_db = -12.0
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.pipeline.work_dir, PathBuf::from("/var/lib/reelforge"));
        assert_eq!(config.providers.preference.len(), 2);
        assert_eq!(config.providers.piapi[0].model, "hailuo-02");
        assert!(config.providers.veo.is_some());
        assert_eq!(config.orchestrator.max_concurrent_jobs, 4);
        assert_eq!(config.compositor.background_gain_db, -12.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.fallback.max_retries_per_provider, 2);
    }
}
