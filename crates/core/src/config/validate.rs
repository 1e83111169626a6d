use super::{types::Config, ConfigError};

/// Validate configuration beyond what deserialization enforces.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for name in &config.providers.preference {
        if !config.providers.resolves(name) {
            return Err(ConfigError::ValidationError(format!(
                "preference entry '{}' does not match any configured provider",
                name
            )));
        }
    }

    for piapi in &config.providers.piapi {
        if piapi.api_key.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "piapi model '{}' has an empty api_key",
                piapi.model
            )));
        }
        if piapi.poll_interval_secs == 0 || piapi.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "piapi model '{}' has a zero poll interval or timeout",
                piapi.model
            )));
        }
    }

    if let Some(veo) = &config.providers.veo {
        if veo.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "veo provider has an empty api_key".to_string(),
            ));
        }
        if veo.poll_interval_secs == 0 || veo.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "veo provider has a zero poll interval or timeout".to_string(),
            ));
        }
    }

    if config.orchestrator.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    if config.compositor.transition_secs < 0.0 {
        return Err(ConfigError::ValidationError(
            "compositor.transition_secs must not be negative".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{PiapiConfig, VeoConfig};

    fn valid_config() -> Config {
        let mut config = Config::default();
        config
            .providers
            .piapi
            .push(PiapiConfig::new("pk", "hailuo-02"));
        config.providers.veo = Some(VeoConfig::new("vk"));
        config.providers.preference =
            vec!["piapi/hailuo-02".to_string(), "veo".to_string()];
        config
    }

    #[test]
    fn test_valid_config_passes() {
        validate_config(&valid_config()).unwrap();
    }

    #[test]
    fn test_empty_preference_is_allowed() {
        // Placeholder-only operation is legal.
        let config = Config::default();
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_unresolved_preference_fails() {
        let mut config = valid_config();
        config.providers.preference.push("sora".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("sora"));
    }

    #[test]
    fn test_empty_api_key_fails() {
        let mut config = valid_config();
        config.providers.piapi[0].api_key.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timing_fails() {
        let mut config = valid_config();
        config.providers.veo.as_mut().unwrap().poll_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_concurrency_fails() {
        let mut config = valid_config();
        config.orchestrator.max_concurrent_jobs = 0;
        assert!(validate_config(&config).is_err());
    }
}
