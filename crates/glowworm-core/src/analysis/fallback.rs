//! Deterministic analyses used when no provider output is available.

use crate::types::{
    AnalysisResult, Complexity, EnhancedAnalysisResult, MediaDescriptor, MediaKind,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed analysis for an image whose vision call failed or was unusable.
pub fn image() -> AnalysisResult {
    AnalysisResult {
        description: "Image uploaded successfully".to_string(),
        objects: strings(&["image"]),
        colors: strings(&["unknown"]),
        mood: "neutral".to_string(),
        confidence: 0.5,
        tags: strings(&["uploaded", "unprocessed"]),
    }
}

/// Basic analysis for a video, computed without a network call.
pub fn video(descriptor: &MediaDescriptor) -> AnalysisResult {
    AnalysisResult {
        description: format!("Video file: {}", descriptor.name),
        objects: strings(&["video", "media"]),
        colors: strings(&["unknown"]),
        mood: "dynamic".to_string(),
        confidence: 0.7,
        tags: strings(&["video", "media", "uploaded"]),
    }
}

/// Basic analysis for an audio file, computed without a network call.
pub fn audio(descriptor: &MediaDescriptor) -> AnalysisResult {
    let mut tags = Vec::with_capacity(3);
    if let Some(subtype) = descriptor.subtype() {
        tags.push(subtype.to_string());
    }
    tags.extend(strings(&["audio", "media"]));

    AnalysisResult {
        description: format!("Audio file: {}", descriptor.name),
        objects: strings(&["audio", "sound"]),
        colors: Vec::new(),
        mood: "neutral".to_string(),
        confidence: 0.5,
        tags,
    }
}

/// Basic analysis for documents and unrecognized files.
pub fn document(descriptor: &MediaDescriptor) -> AnalysisResult {
    let subtype = descriptor.subtype().unwrap_or("unknown");
    AnalysisResult {
        description: format!("File: {}", descriptor.name),
        objects: strings(&["document"]),
        colors: Vec::new(),
        mood: "neutral".to_string(),
        confidence: 0.3,
        tags: vec![subtype.to_string(), "document".to_string()],
    }
}

/// Basic analysis for a non-image kind.
pub fn basic(descriptor: &MediaDescriptor) -> AnalysisResult {
    match descriptor.kind() {
        MediaKind::Image => image(),
        MediaKind::Video => video(descriptor),
        MediaKind::Audio => audio(descriptor),
        MediaKind::Other => document(descriptor),
    }
}

/// Video analysis after a sandbox attempt fell back to local processing.
pub fn sandbox_video(descriptor: &MediaDescriptor) -> AnalysisResult {
    let mut analysis = video(descriptor);
    analysis.tags.extend(strings(&["processed", "analyzed"]));
    analysis.confidence = (analysis.confidence + 0.1).min(1.0);
    analysis
}

/// Placeholder result for a file the batch coordinator could not analyze.
pub fn error_stub(name: &str) -> EnhancedAnalysisResult {
    AnalysisResult {
        description: format!("Failed to analyze: {name}"),
        objects: Vec::new(),
        colors: Vec::new(),
        mood: "unknown".to_string(),
        confidence: 0.1,
        tags: strings(&["error", "failed"]),
    }
    .into_local(Complexity::Simple, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessingMethod;

    #[test]
    fn test_audio_tags_lead_with_subtype() {
        let d = MediaDescriptor::new("song.mp3", 10, "audio/mpeg");
        let a = audio(&d);
        assert_eq!(a.description, "Audio file: song.mp3");
        assert_eq!(a.tags, vec!["mpeg", "audio", "media"]);
        assert!(a.colors.is_empty());
    }

    #[test]
    fn test_document_without_subtype() {
        let d = MediaDescriptor::new("blob", 10, "");
        let a = document(&d);
        assert_eq!(a.tags, vec!["unknown", "document"]);
        assert!((a.confidence - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sandbox_video_enrichment() {
        let d = MediaDescriptor::new("clip.mp4", 10, "video/mp4");
        let a = sandbox_video(&d);
        assert_eq!(
            a.tags,
            vec!["video", "media", "uploaded", "processed", "analyzed"]
        );
        assert!((a.confidence - 0.8).abs() < 1e-6);
        assert_eq!(a.mood, "dynamic");
    }

    #[test]
    fn test_error_stub_shape() {
        let stub = error_stub("broken.png");
        assert_eq!(stub.analysis.description, "Failed to analyze: broken.png");
        assert_eq!(stub.analysis.tags, vec!["error", "failed"]);
        assert_eq!(stub.processing_method, ProcessingMethod::Local);
        assert_eq!(stub.processing_time, 0);
        assert_eq!(stub.complexity, Complexity::Simple);
        assert!(stub.sandbox_id.is_none());
    }

    #[test]
    fn test_basic_dispatches_by_kind() {
        let d = MediaDescriptor::new("notes.pdf", 10, "application/pdf");
        assert_eq!(basic(&d).objects, vec!["document"]);
        let d = MediaDescriptor::new("clip.mov", 10, "video/quicktime");
        assert_eq!(basic(&d).mood, "dynamic");
    }
}
