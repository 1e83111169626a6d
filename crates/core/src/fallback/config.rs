//! Fallback coordinator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for per-scene provider fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// How many times a provider is retried after a transient failure
    /// (unavailable, timed out) before the coordinator advances to the next
    /// provider. Rejections and terminal generation failures advance
    /// immediately.
    #[serde(default = "default_max_retries")]
    pub max_retries_per_provider: u32,

    /// Delay between same-provider retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_retries_per_provider: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}
