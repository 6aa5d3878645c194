//! Core data types for the Glow Worm analysis pipeline.
//!
//! These types describe the input file, the derived complexity tier, and the
//! analysis records produced for it. Field names serialize in camelCase to
//! match the JSON envelopes served to the web front end.

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The file being analyzed, as received at upload time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    /// Original file name
    pub name: String,

    /// Size of the file in bytes
    pub byte_size: u64,

    /// MIME type reported by the uploader (e.g. "image/png")
    pub mime_type: String,
}

impl MediaDescriptor {
    pub fn new(name: impl Into<String>, byte_size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            byte_size,
            mime_type: mime_type.into(),
        }
    }

    /// Media kind derived from the MIME type prefix.
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    /// The MIME subtype ("png" for "image/png"), if present.
    pub fn subtype(&self) -> Option<&str> {
        self.mime_type
            .split_once('/')
            .map(|(_, sub)| sub)
            .filter(|sub| !sub.is_empty())
    }

    /// Size in megabytes (byte_size / 1024²).
    pub fn size_mb(&self) -> f64 {
        self.byte_size as f64 / (1024.0 * 1024.0)
    }
}

/// An uploaded file: descriptor plus its raw bytes.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub descriptor: MediaDescriptor,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Build a file whose descriptor size matches the byte buffer.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            descriptor: MediaDescriptor::new(name, bytes.len() as u64, mime_type),
            bytes,
        }
    }
}

/// Broad media category, taken from the MIME type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    /// Documents and anything with an unrecognized prefix
    Other,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Self {
        let prefix = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match prefix.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }

    pub const ALL: [MediaKind; 4] = [Self::Image, Self::Video, Self::Audio, Self::Other];
}

/// Coarse processing tier derived from media kind and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
    Enterprise,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Enterprise => "enterprise",
        }
    }

    pub const ALL: [Complexity; 4] = [Self::Simple, Self::Medium, Self::Complex, Self::Enterprise];
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an analysis was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    Local,
    Sandbox,
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Sandbox => f.write_str("sandbox"),
        }
    }
}

/// The AI-generated description of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub description: String,
    pub objects: Vec<String>,
    pub colors: Vec<String>,
    pub mood: String,
    /// Confidence from 0.0 to 1.0
    pub confidence: f32,
    pub tags: Vec<String>,
}

impl AnalysisResult {
    /// Attach orchestration metadata for a locally produced result.
    pub fn into_local(self, complexity: Complexity, processing_time_ms: u64) -> EnhancedAnalysisResult {
        EnhancedAnalysisResult {
            analysis: self,
            processing_method: ProcessingMethod::Local,
            processing_time: processing_time_ms,
            complexity,
            sandbox_id: None,
            resource_usage: None,
        }
    }
}

/// Memory/CPU/storage summaries sampled inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub memory: String,
    pub cpu: String,
    pub storage: String,
}

impl ResourceUsage {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self {
            memory: Self::UNKNOWN.to_string(),
            cpu: Self::UNKNOWN.to_string(),
            storage: Self::UNKNOWN.to_string(),
        }
    }
}

/// Analysis plus how, where and how long it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedAnalysisResult {
    #[serde(flatten)]
    pub analysis: AnalysisResult,

    pub processing_method: ProcessingMethod,

    /// Wall time in milliseconds
    pub processing_time: u64,

    pub complexity: Complexity,

    /// Present only for sandbox results that did not fall back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_id: Option<String>,

    /// Present only for sandbox results that did not fall back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_usage: Option<ResourceUsage>,
}

/// Result of one analysis attempt, with fallback made explicit.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// The intended provider produced the analysis
    Success(EnhancedAnalysisResult),
    /// A fallback produced the analysis; `reason` says why
    Degraded(EnhancedAnalysisResult, String),
    /// No analysis could be produced
    Failed(PipelineError),
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    /// The produced result, if any.
    pub fn result(&self) -> Option<&EnhancedAnalysisResult> {
        match self {
            Self::Success(result) | Self::Degraded(result, _) => Some(result),
            Self::Failed(_) => None,
        }
    }

    /// Collapse into a plain result, treating degraded output as usable.
    pub fn into_result(self) -> Result<EnhancedAnalysisResult, PipelineError> {
        match self {
            Self::Success(result) | Self::Degraded(result, _) => Ok(result),
            Self::Failed(err) => Err(err),
        }
    }
}

/// A persisted file record as supplied by the caller for search and
/// recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,

    /// MIME type of the stored file
    #[serde(default, rename = "type")]
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AnalysisSummary>,
}

/// The subset of an analysis stored on a file record. Every field is
/// optional because records may predate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}
