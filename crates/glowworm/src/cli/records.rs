//! `glowworm search` and `glowworm recommend` over a JSON file of records.

use super::FormatArg;
use clap::Args;
use glowworm_core::llm::LlmProviderFactory;
use glowworm_core::{recommend as rank_similar, Config, FileRecord, OutputWriter, SearchEngine};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// JSON array of file records
    #[arg(long)]
    pub files: PathBuf,

    /// Skip the model and rank by text matching only
    #[arg(long)]
    pub text_only: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub format: FormatArg,
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Id of the record to find neighbours for
    pub file_id: String,

    /// JSON array of file records
    #[arg(long)]
    pub files: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub format: FormatArg,
}

/// Read a JSON array of records.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<FileRecord>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not a JSON array of file records: {e}", path.display()))
}

pub async fn search(args: SearchArgs, config: &Config) -> anyhow::Result<()> {
    let records = load_records(&args.files)?;

    let provider = if args.text_only {
        None
    } else {
        match LlmProviderFactory::create(
            &config.llm,
            Duration::from_millis(config.limits.llm_timeout_ms),
        ) {
            Ok(provider) => Some(provider),
            Err(e) => {
                tracing::warn!("Ranking by text match only: {e}");
                None
            }
        }
    };

    let hits = SearchEngine::new(provider).search(&args.query, &records).await?;
    let mut writer = OutputWriter::new(std::io::stdout().lock(), args.format.into());
    writer.write_many(&hits)?;
    writer.flush()?;
    Ok(())
}

pub fn recommend(args: RecommendArgs) -> anyhow::Result<()> {
    let records = load_records(&args.files)?;
    let recommendations = rank_similar(&args.file_id, &records)?;

    let mut writer = OutputWriter::new(std::io::stdout().lock(), args.format.into());
    writer.write_many(&recommendations)?;
    writer.flush()?;
    Ok(())
}
