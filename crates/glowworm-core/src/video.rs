//! Video-generation client (Luma Dream Machine).
//!
//! Generation is asynchronous on the provider side: [`VideoGenerator::generate`]
//! starts a job and [`VideoGenerator::status`] polls it.

use crate::config::{resolve_env_var, VideoConfig};
use crate::error::{ConfigError, PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider-side state of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGeneration {
    pub id: String,
    /// Provider state ("queued", "dreaming", "completed", "failed")
    pub state: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl VideoGeneration {
    /// Whether polling can stop.
    pub fn is_finished(&self) -> bool {
        matches!(self.state.as_str(), "completed" | "failed")
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
    #[serde(rename = "loop")]
    loop_video: bool,
}

#[derive(Deserialize)]
struct GenerationResponse {
    id: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    assets: Option<Assets>,
    #[serde(default)]
    request: Option<EchoedRequest>,
}

#[derive(Deserialize)]
struct Assets {
    video: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct EchoedRequest {
    prompt: Option<String>,
}

impl From<GenerationResponse> for VideoGeneration {
    fn from(resp: GenerationResponse) -> Self {
        let (video_url, thumbnail_url) = resp
            .assets
            .map(|a| (a.video, a.thumbnail))
            .unwrap_or((None, None));
        Self {
            id: resp.id,
            state: resp.state.unwrap_or_else(|| "queued".to_string()),
            video_url,
            thumbnail_url,
            prompt: resp.prompt.or_else(|| resp.request.and_then(|r| r.prompt)),
            failure_reason: resp.failure_reason,
        }
    }
}

pub struct VideoGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    aspect_ratio: String,
    loop_video: bool,
    timeout: Duration,
}

impl VideoGenerator {
    /// Build the client. Fails when the API key is absent.
    pub fn from_config(config: &VideoConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let api_key = resolve_env_var(&config.api_key)
            .ok_or_else(|| ConfigError::not_configured("video", "set the LUMA_API_KEY env var"))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            aspect_ratio: config.aspect_ratio.clone(),
            loop_video: config.loop_video,
            timeout,
        })
    }

    /// Start a generation for `prompt`.
    pub async fn generate(&self, prompt: &str) -> PipelineResult<VideoGeneration> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::InvalidInput("Prompt is required".to_string()));
        }

        let body = GenerationRequest {
            prompt,
            aspect_ratio: &self.aspect_ratio,
            loop_video: self.loop_video,
        };
        let resp = self
            .client
            .post(format!("{}/generations", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let generation = self.read(resp).await?;
        tracing::info!(id = %generation.id, state = %generation.state, "Video generation started");
        Ok(generation)
    }

    /// Current state of generation `id`.
    pub async fn status(&self, id: &str) -> PipelineResult<VideoGeneration> {
        if id.trim().is_empty() {
            return Err(PipelineError::InvalidInput("Generation ID is required".to_string()));
        }

        let resp = self
            .client
            .get(format!("{}/generations/{}", self.endpoint, id.trim()))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await;

        let generation = self.read(resp).await?;
        tracing::debug!(id = %generation.id, state = %generation.state, "Video status");
        Ok(generation)
    }

    async fn read(
        &self,
        resp: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> PipelineResult<VideoGeneration> {
        let resp = resp.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout {
                    stage: "video".to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                PipelineError::provider(format!("Video request failed: {e}"), None)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::provider(
                format!("Video provider HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let parsed: GenerationResponse = resp.json().await.map_err(|e| {
            PipelineError::provider(format!("Failed to parse video provider response: {e}"), None)
        })?;
        Ok(parsed.into())
    }
}
