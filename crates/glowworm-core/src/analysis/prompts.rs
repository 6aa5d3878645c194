//! Prompt text sent to the completion provider.

use crate::types::AnalysisResult;

pub const ANALYZE_IMAGE: &str = r#"Analyze this image and provide a detailed analysis in JSON format with the following structure:
{
  "description": "A detailed description of the image",
  "objects": ["list", "of", "main", "objects"],
  "colors": ["dominant", "colors"],
  "mood": "overall mood/emotion",
  "confidence": 0.95,
  "tags": ["relevant", "searchable", "tags"]
}

Respond with the JSON object only. Be accurate and include specific details that would help someone find this image later in a media library."#;

pub const SUGGEST_TAGS_SYSTEM: &str = "You generate searchable tags for media files. \
Produce 5-10 relevant, specific tags that would help someone find this content later.";

pub const RANK_FILES_SYSTEM: &str = r#"You are a search assistant for a media library. Match the user's query against the provided media files using the semantic meaning of the query, file names, descriptions, tags, and analysis data (objects, colors, moods).

Return only a JSON array ranked by relevance with scores from 0 to 1:
[{"id": "file_id", "score": 0.95, "reason": "why this matches"}]"#;

pub fn suggest_tags(analysis: &AnalysisResult) -> String {
    format!(
        "Generate tags for this media analysis:\n\
         Description: {}\n\
         Objects: {}\n\
         Colors: {}\n\
         Mood: {}\n\n\
         Return only a JSON array of tags: [\"tag1\", \"tag2\", \"tag3\"]",
        analysis.description,
        analysis.objects.join(", "),
        analysis.colors.join(", "),
        analysis.mood,
    )
}

/// Strip a surrounding Markdown code fence (```json ... ```) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
