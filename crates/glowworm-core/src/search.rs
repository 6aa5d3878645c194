//! Search over caller-supplied file records.
//!
//! The completion provider ranks the records when one is available; a
//! case-insensitive text match is used when it is absent, fails, or
//! replies with something other than a JSON array of hits.

use crate::analysis::prompts::strip_code_fence;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::{LlmProvider, LlmRequest};
use crate::types::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub reason: String,
}

pub struct SearchEngine {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl SearchEngine {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    /// Rank `files` against `query`, best match first.
    pub async fn search(&self, query: &str, files: &[FileRecord]) -> PipelineResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::InvalidInput("Query is required".to_string()));
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(provider) = &self.provider {
            match rank_with_provider(provider.as_ref(), query, files).await {
                Ok(hits) => return Ok(hits),
                Err(reason) => {
                    tracing::warn!("Provider ranking unusable, using text match: {reason}")
                }
            }
        }

        Ok(text_match(query, files))
    }
}

async fn rank_with_provider(
    provider: &dyn LlmProvider,
    query: &str,
    files: &[FileRecord],
) -> Result<Vec<SearchHit>, String> {
    let request = LlmRequest::rank_files(query, &listing(files));
    let response = provider.generate(&request).await.map_err(|e| e.to_string())?;
    let mut hits: Vec<SearchHit> = serde_json::from_str(strip_code_fence(&response.text))
        .map_err(|e| format!("unparsable ranking: {e}"))?;

    // Drop ids the provider invented
    let known: HashSet<&str> = files.iter().map(|f| f.id.as_str()).collect();
    hits.retain(|hit| known.contains(hit.id.as_str()));
    for hit in &mut hits {
        hit.score = hit.score.clamp(0.0, 1.0);
    }
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(hits)
}

/// Textual description of the records for the ranking prompt.
fn listing(files: &[FileRecord]) -> String {
    fn or_none(items: &[String], label: &str) -> String {
        if items.is_empty() {
            format!("No {label}")
        } else {
            items.join(", ")
        }
    }

    files
        .iter()
        .map(|file| {
            let analysis = file.ai_analysis.clone().unwrap_or_default();
            format!(
                "ID: {}\nName: {}\nDescription: {}\nTags: {}\nObjects: {}\nColors: {}\nMood: {}",
                file.id,
                file.name,
                analysis.description.as_deref().unwrap_or("No description"),
                or_none(&file.tags, "tags"),
                or_none(&analysis.objects, "objects"),
                or_none(&analysis.colors, "colors"),
                analysis.mood.as_deref().unwrap_or("No mood"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Deterministic fallback: substring matches on name, tags and description.
pub fn text_match(query: &str, files: &[FileRecord]) -> Vec<SearchHit> {
    let term = query.trim().to_lowercase();
    let mut hits: Vec<SearchHit> = files
        .iter()
        .filter_map(|file| {
            let mut score = 0.0f32;
            let mut reasons = Vec::new();

            if file.name.to_lowercase().contains(&term) {
                score += 0.8;
                reasons.push("filename match");
            }
            if file.tags.iter().any(|tag| tag.to_lowercase().contains(&term)) {
                score += 0.6;
                reasons.push("tag match");
            }
            let description = file
                .ai_analysis
                .as_ref()
                .and_then(|a| a.description.as_deref())
                .unwrap_or_default();
            if description.to_lowercase().contains(&term) {
                score += 0.4;
                reasons.push("description match");
            }

            (score > 0.0).then(|| SearchHit {
                id: file.id.clone(),
                score,
                reason: reasons.join(", "),
            })
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}
