//! The `glowworm video` command.

use super::FormatArg;
use clap::{Args, Subcommand};
use glowworm_core::{Config, OutputWriter, VideoGeneration, VideoGenerator};
use indicatif::ProgressBar;
use std::time::{Duration, Instant};

#[derive(Args, Debug)]
pub struct VideoArgs {
    #[command(subcommand)]
    pub command: VideoCommand,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary", global = true)]
    pub format: FormatArg,
}

#[derive(Subcommand, Debug)]
pub enum VideoCommand {
    /// Start a generation from a text prompt
    Generate {
        prompt: String,

        /// Poll until the generation finishes
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        polling: Polling,
    },

    /// Show the state of a generation
    Status {
        id: String,

        /// Poll until the generation finishes
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        polling: Polling,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Polling {
    /// Seconds between status checks
    #[arg(long, default_value = "5")]
    pub interval: u64,

    /// Give up waiting after this many seconds
    #[arg(long, default_value = "600")]
    pub max_wait: u64,
}

pub async fn execute(args: VideoArgs, config: &Config) -> anyhow::Result<()> {
    let generator = VideoGenerator::from_config(
        &config.video,
        Duration::from_millis(config.limits.video_timeout_ms),
    )?;

    let generation = match args.command {
        VideoCommand::Generate {
            prompt,
            wait,
            polling,
        } => {
            let started = generator.generate(&prompt).await?;
            if wait {
                wait_for(&generator, started, polling).await?
            } else {
                started
            }
        }
        VideoCommand::Status { id, wait, polling } => {
            let current = generator.status(&id).await?;
            if wait {
                wait_for(&generator, current, polling).await?
            } else {
                current
            }
        }
    };

    let mut writer = OutputWriter::new(std::io::stdout().lock(), args.format.into());
    writer.write_one(&generation)?;
    writer.flush()?;
    Ok(())
}

async fn wait_for(
    generator: &VideoGenerator,
    mut generation: VideoGeneration,
    polling: Polling,
) -> anyhow::Result<VideoGeneration> {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    let deadline = Instant::now() + Duration::from_secs(polling.max_wait);

    while !generation.is_finished() {
        spinner.set_message(format!("{}: {}", generation.id, generation.state));
        if Instant::now() >= deadline {
            spinner.finish_and_clear();
            anyhow::bail!(
                "Generation {} still {} after {}s",
                generation.id,
                generation.state,
                polling.max_wait
            );
        }
        tokio::time::sleep(Duration::from_secs(polling.interval.max(1))).await;
        generation = generator.status(&generation.id).await?;
    }

    spinner.finish_and_clear();
    tracing::info!(id = %generation.id, state = %generation.state, "Generation finished");
    Ok(generation)
}
