//! Vision/completion provider trait and request/response types.
//!
//! Defines the interface the analysis components call, plus the factory
//! that builds the configured provider once at startup.

use crate::analysis::prompts;
use crate::config::{resolve_env_var, LlmConfig};
use crate::error::{ConfigError, PipelineError};
use crate::types::AnalysisResult;
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to a vision API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and the uploader's MIME type.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        let media_type = match mime_type {
            "image/jpeg" | "image/jpg" => "image/jpeg",
            "image/png" => "image/png",
            "image/webp" => "image/webp",
            "image/gif" => "image/gif",
            other => {
                tracing::warn!("Unsupported vision MIME type '{other}', sending as image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Image to attach, for vision requests
    pub image: Option<ImageInput>,
    /// Optional system instruction
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Vision request asking for the structured analysis JSON object.
    pub fn analyze_image(image: ImageInput) -> Self {
        Self {
            image: Some(image),
            system: None,
            prompt: prompts::ANALYZE_IMAGE.to_string(),
            max_tokens: 500,
            temperature: 0.2,
        }
    }

    /// Text request asking for extra searchable tags for an analysis.
    pub fn suggest_tags(analysis: &AnalysisResult) -> Self {
        Self {
            image: None,
            system: Some(prompts::SUGGEST_TAGS_SYSTEM.to_string()),
            prompt: prompts::suggest_tags(analysis),
            max_tokens: 100,
            temperature: 0.3,
        }
    }

    /// Text request asking to rank a file listing against a search query.
    pub fn rank_files(query: &str, listing: &str) -> Self {
        Self {
            image: None,
            system: Some(prompts::RANK_FILES_SYSTEM.to_string()),
            prompt: format!("Search query: \"{query}\"\n\nAvailable files:\n{listing}"),
            max_tokens: 1000,
            temperature: 0.0,
        }
    }
}

/// The response from a completion call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all completion providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (components hold an `Arc<dyn LlmProvider>`).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "xai").
    fn name(&self) -> &str;

    /// Generate a completion for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Factory that creates the configured provider.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the provider named by `config.provider`.
    ///
    /// Fails fast when the provider's API key is absent.
    pub fn create(
        config: &LlmConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let (name, cfg, env_hint) = match config.provider.as_str() {
            "openai" => ("openai", &config.openai, "OPENAI_API_KEY"),
            "xai" => ("xai", &config.xai, "XAI_API_KEY"),
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown LLM provider: {other}"
                )))
            }
        };

        let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
            ConfigError::not_configured(name, format!("set the {env_hint} env var"))
        })?;

        Ok(Arc::new(super::openai::OpenAiProvider::with_endpoint(
            name,
            &api_key,
            &cfg.model,
            &cfg.endpoint,
            timeout,
        )))
    }
}
