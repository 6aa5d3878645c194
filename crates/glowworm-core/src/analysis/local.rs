//! Local analysis through the vision/completion provider.
//!
//! Images get one vision call; other kinds get a basic analysis with no
//! network traffic. Nothing here returns an error: every failure becomes
//! the deterministic fallback plus a degradation reason.

use super::tags::{dedup_tags, MAX_TAGS};
use super::{fallback, prompts};
use crate::llm::{ImageInput, LlmProvider, LlmRequest};
use crate::types::{AnalysisResult, MediaDescriptor, MediaKind};
use serde::Deserialize;
use std::sync::Arc;

/// Result of a local analysis, with the reason when a fallback was used.
#[derive(Debug, Clone)]
pub struct LocalAnalysis {
    pub analysis: AnalysisResult,
    pub degraded: Option<String>,
}

impl LocalAnalysis {
    fn ok(analysis: AnalysisResult) -> Self {
        Self {
            analysis,
            degraded: None,
        }
    }

    fn fallback(reason: String) -> Self {
        Self {
            analysis: fallback::image(),
            degraded: Some(reason),
        }
    }
}

/// Vision reply. Every key is required; a missing key rejects the reply.
#[derive(Deserialize)]
struct VisionReply {
    description: String,
    objects: Vec<String>,
    colors: Vec<String>,
    mood: String,
    confidence: f32,
    tags: Vec<String>,
}

/// Parse a vision reply into an analysis, clamping confidence to [0, 1].
///
/// Reply tags are deduplicated and capped at [`MAX_TAGS`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, String> {
    let body = prompts::strip_code_fence(text);
    if body.is_empty() {
        return Err("empty reply".to_string());
    }

    let reply: VisionReply =
        serde_json::from_str(body).map_err(|e| format!("unparsable reply: {e}"))?;

    Ok(AnalysisResult {
        description: reply.description,
        objects: reply.objects,
        colors: reply.colors,
        mood: reply.mood,
        confidence: reply.confidence.clamp(0.0, 1.0),
        tags: dedup_tags(reply.tags.iter().map(String::as_str), MAX_TAGS),
    })
}

/// Analyzer backed by a single completion provider.
pub struct LocalAnalyzer {
    provider: Arc<dyn LlmProvider>,
}

impl LocalAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Analyze one file. Never fails.
    pub async fn analyze_local(&self, bytes: &[u8], descriptor: &MediaDescriptor) -> LocalAnalysis {
        match descriptor.kind() {
            MediaKind::Image => self.analyze_image(bytes, &descriptor.mime_type).await,
            _ => LocalAnalysis::ok(fallback::basic(descriptor)),
        }
    }

    async fn analyze_image(&self, bytes: &[u8], mime_type: &str) -> LocalAnalysis {
        let request = LlmRequest::analyze_image(ImageInput::from_bytes(bytes, mime_type));

        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), "Vision call failed: {e}");
                return LocalAnalysis::fallback(format!("vision call failed: {e}"));
            }
        };

        tracing::debug!(
            model = %response.model,
            latency_ms = response.latency_ms,
            "Vision reply received"
        );

        match parse_analysis(&response.text) {
            Ok(analysis) => LocalAnalysis::ok(analysis),
            Err(reason) => {
                tracing::warn!(provider = self.provider.name(), "Discarding vision reply: {reason}");
                LocalAnalysis::fallback(reason)
            }
        }
    }

    /// Ask the provider for additional searchable tags.
    ///
    /// Falls back to the analysis' own tags on any failure or when the
    /// reply is not a JSON array of strings.
    pub async fn suggest_tags(&self, analysis: &AnalysisResult) -> Vec<String> {
        let request = LlmRequest::suggest_tags(analysis);
        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Tag suggestion failed: {e}");
                return analysis.tags.clone();
            }
        };

        match serde_json::from_str::<Vec<String>>(prompts::strip_code_fence(&response.text)) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::debug!("Tag suggestion reply is not a string array: {e}");
                analysis.tags.clone()
            }
        }
    }
}
