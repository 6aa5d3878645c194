//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const KNOWN_LLM_PROVIDERS: [&str; 2] = ["openai", "xai"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.batch_size must be > 0".into(),
            ));
        }
        if self.sandbox.retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "sandbox.retry_attempts must be > 0".into(),
            ));
        }
        if self.sandbox.upload_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "sandbox.upload_chunk_size must be > 0".into(),
            ));
        }
        if self.sandbox.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "sandbox.request_timeout_ms must be > 0".into(),
            ));
        }
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "llm.provider must be one of {}, got '{}'",
                KNOWN_LLM_PROVIDERS.join(", "),
                self.llm.provider
            )));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.video_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.video_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
