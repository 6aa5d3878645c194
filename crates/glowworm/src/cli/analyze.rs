//! The `glowworm analyze` command.

use super::FormatArg;
use crate::media;
use clap::Args;
use glowworm_core::{
    AnalysisServices, BatchCoordinator, BatchReport, Config, EnhancedAnalysisResult,
    MediaAnalyzer, OutputWriter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// User the analyses are attributed to
    #[arg(long, default_value = "cli")]
    pub user_id: String,

    /// Files analyzed concurrently per group
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Never use the remote sandbox
    #[arg(long)]
    pub local_only: bool,

    /// Skip the extra tag-suggestion pass
    #[arg(long)]
    pub no_suggest_tags: bool,
}

pub async fn execute(args: AnalyzeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(batch_size) = args.batch_size {
        config.analysis.batch_size = batch_size.max(1);
    }
    if args.local_only {
        config.sandbox.enabled = false;
    }
    if args.no_suggest_tags {
        config.analysis.suggest_tags = false;
    }

    let paths = media::discover(&args.inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No files found in the given inputs");
    }
    let files = paths
        .iter()
        .map(|path| media::load(path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let services = AnalysisServices::from_config(&config)?;
    let analyzer = Arc::new(MediaAnalyzer::new(services, &config));
    let coordinator = BatchCoordinator::new(analyzer.clone(), config.analysis.batch_size);

    let progress = progress_bar(files.len() as u64);
    let start = Instant::now();
    let mut results = coordinator
        .batch_analyze_with(files, &args.user_id, |_, result| {
            progress.inc(1);
            progress.set_message(format!("{} via {}", result.complexity, result.processing_method));
        })
        .await;
    progress.finish_and_clear();

    for result in results.iter_mut() {
        analyzer.add_suggested_tags(result).await;
    }

    write_results(&args, &results)?;
    print_summary(&BatchReport::from_results(&results), start.elapsed());
    Ok(())
}

fn write_results(args: &AnalyzeArgs, results: &[EnhancedAnalysisResult]) -> anyhow::Result<()> {
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, args.format.into());
    if results.len() == 1 {
        writer.write_one(&results[0])?;
    } else {
        writer.write_many(results)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        tracing::info!("Output written to {}", path.display());
    }
    Ok(())
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_message("analyzing...");
    bar
}

fn print_summary(report: &BatchReport, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Local:        {:>8}", report.local);
    eprintln!("    Sandbox:      {:>8}", report.sandbox);
    if report.failed > 0 {
        eprintln!("    Failed:       {:>8}", report.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Analysis time:{:>7.1}s", report.total_time_ms as f64 / 1000.0);
    eprintln!("  ====================================");
}
