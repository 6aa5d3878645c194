//! Glow Worm Core - media analysis pipeline for Glow Worm Studio.
//!
//! Uploaded files are classified into a complexity tier, routed to local
//! vision analysis or to an ephemeral remote sandbox, and always come back
//! with a usable [`EnhancedAnalysisResult`]: failures degrade to fallback
//! analyses instead of surfacing to the caller.
//!
//! ```text
//! File → Classify → Select method → Local | Sandbox → Fallback → Tags → JSON
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use glowworm_core::{AnalysisServices, Config, MediaAnalyzer, MediaFile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let analyzer = MediaAnalyzer::new(AnalysisServices::from_config(&config)?, &config);
//!
//!     let file = MediaFile::new("cave.jpg", "image/jpeg", std::fs::read("cave.jpg")?);
//!     let result = analyzer.analyze(&file, "user-1").await.into_result()?;
//!     println!("{}", result.analysis.description);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod recommend;
pub mod search;
pub mod types;
pub mod video;

pub use analysis::{AnalysisServices, BatchCoordinator, FileAnalyzer, MediaAnalyzer};
pub use config::Config;
pub use error::{ConfigError, GlowError, PipelineError, PipelineResult, Result};
pub use output::{BatchReport, OutputFormat, OutputWriter};
pub use recommend::{recommend, Recommendation};
pub use search::{SearchEngine, SearchHit};
pub use types::{
    AnalysisOutcome, AnalysisResult, AnalysisSummary, Complexity, EnhancedAnalysisResult,
    FileRecord, MediaDescriptor, MediaFile, MediaKind, ProcessingMethod, ResourceUsage,
};
pub use video::{VideoGeneration, VideoGenerator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
