//! Sub-configuration structs with their defaults.

use crate::analysis::policy::MethodPolicy;
use serde::{Deserialize, Serialize};

/// Analysis pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Files analyzed concurrently per batch group
    pub batch_size: usize,

    /// Run a second LLM pass that proposes extra searchable tags
    pub suggest_tags: bool,

    /// (media kind, complexity) -> processing method
    pub policy: MethodPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            suggest_tags: true,
            policy: MethodPolicy::default(),
        }
    }
}

/// Remote sandbox (Daytona) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Set to false to keep every analysis local
    pub enabled: bool,

    /// Sandbox API base URL
    pub api_url: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Session provisioning attempts before giving up
    pub retry_attempts: u32,

    /// Backoff base: attempt n waits base * 2^n before retrying
    pub retry_base_delay_ms: u64,

    /// Characters of base64 per shell command when native upload is unavailable
    pub upload_chunk_size: usize,

    /// Use the provider's file-upload API when it has one
    pub native_upload: bool,

    /// Prefer pre-provisioned snapshot environments
    pub use_snapshot: bool,

    /// Snapshot name with Node.js and the analysis dependencies installed
    pub snapshot: String,

    /// AI provider the in-sandbox script calls
    pub ai_provider: String,

    /// Model the in-sandbox script requests
    pub model: String,

    /// Per-request timeout for sandbox API calls (not command execution)
    pub request_timeout_ms: u64,

    /// Environment variables forwarded into every session as credentials
    pub forward_env: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://app.daytona.io/api".to_string(),
            api_key: "${DAYTONA_API_KEY}".to_string(),
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            upload_chunk_size: 1000,
            native_upload: true,
            use_snapshot: true,
            snapshot: "glowworm-node".to_string(),
            ai_provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            request_timeout_ms: 60_000,
            forward_env: vec![
                "OPENAI_API_KEY".to_string(),
                "XAI_API_KEY".to_string(),
                "ELEVENLABS_API_KEY".to_string(),
            ],
        }
    }
}

/// Vision/completion provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Active provider: "openai" or "xai"
    pub provider: String,

    /// OpenAI configuration
    pub openai: ChatProviderConfig,

    /// xAI configuration (OpenAI-compatible API)
    pub xai: ChatProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            openai: ChatProviderConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: "${OPENAI_API_KEY}".to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            xai: ChatProviderConfig {
                endpoint: "https://api.x.ai/v1/chat/completions".to_string(),
                api_key: "${XAI_API_KEY}".to_string(),
                model: "grok-2-vision-1212".to_string(),
            },
        }
    }
}

/// Settings for one Chat Completions compatible provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatProviderConfig {
    /// Chat Completions endpoint URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

/// Video-generation provider (Luma Dream Machine) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// API base URL; generations live under `<endpoint>/generations`
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Aspect ratio requested for new generations
    pub aspect_ratio: String,

    /// Request a looping video
    pub loop_video: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.lumalabs.ai/dream-machine/v1".to_string(),
            api_key: "${LUMA_API_KEY}".to_string(),
            aspect_ratio: "16:9".to_string(),
            loop_video: false,
        }
    }
}

/// Timeouts and size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Vision/completion call timeout in milliseconds
    pub llm_timeout_ms: u64,

    /// Video provider call timeout in milliseconds
    pub video_timeout_ms: u64,

    /// Largest accepted upload in megabytes
    pub max_upload_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 60_000,
            video_timeout_ms: 30_000,
            max_upload_mb: 1024,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
