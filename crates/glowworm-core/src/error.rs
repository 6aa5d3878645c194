//! Error types for the Glow Worm analysis pipeline.
//!
//! Errors are organized by concern so callers can tell a missing credential
//! apart from a provider outage or a failed sandbox stage. Nothing in the
//! analysis path is fatal: the orchestration layer turns every
//! `PipelineError` into a degraded-but-valid result.

use thiserror::Error;

/// Top-level error type for Glow Worm operations.
#[derive(Error, Debug)]
pub enum GlowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required credential or endpoint is absent
    #[error("{service} not configured: {hint}")]
    NotConfigured { service: String, hint: String },
}

impl ConfigError {
    pub fn not_configured(service: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::NotConfigured {
            service: service.into(),
            hint: hint.into(),
        }
    }
}

/// Pipeline errors, organized by collaborator and stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An external provider (vision, sandbox API, video) rejected or failed a call
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        /// HTTP status code, when the failure came from an HTTP response
        status_code: Option<u16>,
    },

    /// A sandbox stage failed after the session was provisioned
    #[error("Sandbox {stage} failed: {message}")]
    Sandbox { stage: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// The caller supplied unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator needed for this path is not configured
    #[error(transparent)]
    NotConfigured(#[from] ConfigError),
}

impl PipelineError {
    pub(crate) fn provider(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Provider {
            message: message.into(),
            status_code,
        }
    }

    pub(crate) fn sandbox(stage: &str, message: impl Into<String>) -> Self {
        Self::Sandbox {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status code reported by the provider, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Convenience type alias for Glow Worm results.
pub type Result<T> = std::result::Result<T, GlowError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message_names_service() {
        let err = ConfigError::not_configured("Sandbox", "set DAYTONA_API_KEY");
        assert_eq!(err.to_string(), "Sandbox not configured: set DAYTONA_API_KEY");
    }

    #[test]
    fn test_status_code_only_for_provider_errors() {
        let err = PipelineError::provider("HTTP 503", Some(503));
        assert_eq!(err.status_code(), Some(503));
        let err = PipelineError::sandbox("upload", "disk full");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "Sandbox upload failed: disk full");
    }
}
