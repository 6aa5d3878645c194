//! The media-analysis pipeline.
//!
//! classify -> select method -> analyze (local or sandbox) -> fall back ->
//! synthesize tags, plus the batch coordinator that fans files out.

pub mod batch;
pub mod classify;
pub mod fallback;
pub mod local;
pub mod policy;
pub mod prompts;
pub mod sandbox;
pub mod service;
pub mod tags;

pub use batch::{BatchCoordinator, FileAnalyzer};
pub use classify::classify;
pub use local::{LocalAnalysis, LocalAnalyzer};
pub use policy::{execution_timeout, MethodPolicy, TierMethods};
pub use service::{AnalysisServices, MediaAnalyzer};
pub use tags::synthesize_tags;
