//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the scene orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum coordinator runs in flight at once. Polling occupies a slot
    /// for the whole job lifetime, so this is also the ceiling on
    /// concurrently billable jobs.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Per-run deadline in seconds. 0 disables the deadline; per-provider
    /// job deadlines still bound each scene.
    #[serde(default)]
    pub run_deadline_secs: u64,
}

fn default_max_concurrent() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent(),
            run_deadline_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.run_deadline_secs, 0);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            max_concurrent_jobs = 5
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_concurrent_jobs, 5);
        assert_eq!(config.run_deadline_secs, 0);
    }
}
