//! Similarity recommendations between file records.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{AnalysisSummary, FileRecord};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Maximum recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 12;

/// Scores at or below this are dropped.
pub const MIN_SCORE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub score: f32,
    pub reason: String,
}

/// |a ∩ b| / max(|a|, |b|), counting items of `a` present in `b`.
fn overlap_ratio(a: &[String], b: &[String]) -> f32 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let shared = a.iter().filter(|item| b.contains(item)).count();
    shared as f32 / longest as f32
}

fn score(target: &FileRecord, candidate: &FileRecord) -> (f32, Vec<&'static str>) {
    let empty = AnalysisSummary::default();
    let t = target.ai_analysis.as_ref().unwrap_or(&empty);
    let c = candidate.ai_analysis.as_ref().unwrap_or(&empty);

    let mut score = 0.0f32;
    let mut reasons = Vec::new();

    if t.mood.is_some() && t.mood == c.mood {
        score += 0.4;
        reasons.push("similar mood");
    }

    let weighted = [
        (overlap_ratio(&t.colors, &c.colors), 0.3, "similar colors"),
        (overlap_ratio(&t.objects, &c.objects), 0.3, "similar objects"),
        (overlap_ratio(&target.tags, &candidate.tags), 0.2, "similar tags"),
    ];
    for (ratio, weight, reason) in weighted {
        if ratio > 0.0 {
            score += ratio * weight;
            reasons.push(reason);
        }
    }

    if target.mime_type == candidate.mime_type {
        score += 0.1;
        reasons.push("same type");
    }

    if let (Some(a), Some(b)) = (target.uploaded_at, candidate.uploaded_at) {
        if (a - b).abs() < Duration::days(7) {
            score += 0.1;
            reasons.push("uploaded recently");
        }
    }

    (score.min(1.0), reasons)
}

/// Records most similar to `target_id`, best first.
pub fn recommend(target_id: &str, files: &[FileRecord]) -> PipelineResult<Vec<Recommendation>> {
    let target = files
        .iter()
        .find(|f| f.id == target_id)
        .ok_or_else(|| PipelineError::NotFound(format!("File {target_id}")))?;

    let mut recommendations: Vec<Recommendation> = files
        .iter()
        .filter(|f| f.id != target_id)
        .filter_map(|candidate| {
            let (score, reasons) = score(target, candidate);
            (score > MIN_SCORE).then(|| Recommendation {
                id: candidate.id.clone(),
                score,
                reason: reasons.join(", "),
            })
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    recommendations.truncate(MAX_RECOMMENDATIONS);
    Ok(recommendations)
}
