//! Configuration management for Glow Worm.
//!
//! Configuration is loaded from the platform config directory
//! (`~/.config/glowworm/config.toml` on Linux) with defaults for every
//! section. Secrets may be written as `${ENV_VAR}` and are resolved when the
//! provider clients are constructed.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Glow Worm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis pipeline settings
    pub analysis: AnalysisConfig,

    /// Remote sandbox settings
    pub sandbox: SandboxConfig,

    /// Vision/completion provider settings
    pub llm: LlmConfig,

    /// Video-generation provider settings
    pub video: VideoConfig,

    /// Timeouts and size limits
    pub limits: LimitsConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/studio.glowworm.glowworm/config.toml
    /// - Linux: ~/.config/glowworm/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\glowworm\config\config.toml
    ///
    /// Falls back to ~/.glowworm/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("studio", "glowworm", "glowworm")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".glowworm").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Plain values pass through; empty values and unset variables yield `None`.
pub fn resolve_env_var(value: &str) -> Option<String> {
    let resolved = if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()?
    } else {
        value.to_string()
    };
    if resolved.trim().is_empty() {
        None
    } else {
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Complexity, MediaKind, ProcessingMethod};
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.batch_size, 3);
        assert_eq!(config.sandbox.retry_attempts, 3);
        assert_eq!(config.sandbox.upload_chunk_size, 1000);
        assert_eq!(config.video.aspect_ratio, "16:9");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[analysis]"));
        assert!(toml.contains("[sandbox]"));
        assert!(toml.contains("[analysis.policy.video]"));
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nbatch_size = 5\n\n[analysis.policy.image]\nenterprise = \"sandbox\"\n\n[server]\nport = 8080"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.analysis.batch_size, 5);
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.analysis.policy.method_for(MediaKind::Image, Complexity::Enterprise),
            ProcessingMethod::Sandbox
        );
        // Unlisted tiers keep their defaults
        assert_eq!(
            config.analysis.policy.method_for(MediaKind::Image, Complexity::Simple),
            ProcessingMethod::Local
        );
        assert_eq!(config.sandbox.api_url, "https://app.daytona.io/api");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nbatch_size = 0").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("   "), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_GLOWWORM_123}"), None);
    }
}
