//! Tag synthesis from analysis fields.

use crate::types::AnalysisResult;
use std::collections::HashSet;

/// Maximum number of synthesized tags.
pub const MAX_TAGS: usize = 10;

const MAX_OBJECT_TAGS: usize = 5;
const MAX_COLOR_TAGS: usize = 3;

/// The confidence bucket tag for a score.
pub fn confidence_tag(confidence: f32) -> &'static str {
    if confidence > 0.8 {
        "high-confidence"
    } else if confidence > 0.6 {
        "medium-confidence"
    } else {
        "low-confidence"
    }
}

/// Build the tag list for an analysis.
///
/// Order: `base_tags`, up to five objects, the mood, up to three colors,
/// then exactly one confidence bucket. Duplicates keep their first
/// position, empty strings are skipped, and the list is capped at
/// [`MAX_TAGS`].
pub fn synthesize_tags(analysis: &AnalysisResult, base_tags: &[&str]) -> Vec<String> {
    let candidates = base_tags
        .iter()
        .copied()
        .chain(analysis.objects.iter().take(MAX_OBJECT_TAGS).map(String::as_str))
        .chain(std::iter::once(analysis.mood.as_str()))
        .chain(analysis.colors.iter().take(MAX_COLOR_TAGS).map(String::as_str))
        .chain(std::iter::once(confidence_tag(analysis.confidence)));

    dedup_tags(candidates, MAX_TAGS)
}

/// Deduplicate tags preserving first-seen order, skipping blanks.
pub fn dedup_tags<'a>(tags: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(objects: &[&str], colors: &[&str], mood: &str, confidence: f32) -> AnalysisResult {
        AnalysisResult {
            description: String::new(),
            objects: objects.iter().map(|s| s.to_string()).collect(),
            colors: colors.iter().map(|s| s.to_string()).collect(),
            mood: mood.to_string(),
            confidence,
            tags: vec![],
        }
    }

    #[test]
    fn test_order_and_bucket() {
        let a = analysis(&["dog", "ball"], &["green"], "playful", 0.9);
        let tags = synthesize_tags(&a, &["video"]);
        assert_eq!(
            tags,
            vec!["video", "dog", "ball", "playful", "green", "high-confidence"]
        );
    }

    #[test]
    fn test_cap_at_ten_without_duplicates() {
        let a = analysis(
            &["a", "b", "c", "d", "e", "f", "g"],
            &["red", "blue", "green", "white"],
            "calm",
            0.7,
        );
        let tags = synthesize_tags(&a, &["x", "y", "a"]);
        assert!(tags.len() <= MAX_TAGS);
        let unique: HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        // objects past the fifth never appear
        assert!(!tags.contains(&"f".to_string()));
    }

    #[test]
    fn test_exactly_one_confidence_bucket() {
        for confidence in [0.0, 0.6, 0.61, 0.8, 0.81, 1.0] {
            let tags = synthesize_tags(&analysis(&[], &[], "calm", confidence), &[]);
            let buckets = tags.iter().filter(|t| t.ends_with("-confidence")).count();
            assert_eq!(buckets, 1, "confidence {confidence}");
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(confidence_tag(0.8), "medium-confidence");
        assert_eq!(confidence_tag(0.6), "low-confidence");
        assert_eq!(confidence_tag(0.85), "high-confidence");
    }

    #[test]
    fn test_empty_strings_skipped() {
        let tags = synthesize_tags(&analysis(&["", "cat"], &[], "", 0.5), &[""]);
        assert_eq!(tags, vec!["cat", "low-confidence"]);
    }
}
