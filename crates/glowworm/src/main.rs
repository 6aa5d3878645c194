//! Glow Worm - media analysis for Glow Worm Studio.
//!
//! Analyzes images, videos, audio and documents with a vision model, routing
//! heavy files through an ephemeral remote sandbox, and serves the same
//! pipeline over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Analyze files or a directory
//! glowworm analyze ./uploads --format summary
//!
//! # Show how a file would be routed
//! glowworm classify clip.mp4
//!
//! # Start a video generation and wait for it
//! glowworm video generate "a glowing cave at night" --wait
//!
//! # Run the HTTP API
//! glowworm serve --port 3001
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod media;
mod server;

/// Glow Worm - media analysis with sandboxed AI processing.
#[derive(Parser, Debug)]
#[command(name = "glowworm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze media files
    Analyze(cli::analyze::AnalyzeArgs),

    /// Show complexity tier, processing method and timeout for files
    Classify(cli::classify::ClassifyArgs),

    /// Generate videos from prompts
    Video(cli::video::VideoArgs),

    /// Search a JSON file of records
    Search(cli::records::SearchArgs),

    /// Recommend records similar to one record
    Recommend(cli::records::RecommendArgs),

    /// Run the HTTP API
    Serve(cli::serve::ServeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet, so config problems go straight to stderr
    let config = match glowworm_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `glowworm config path`."
            );
            glowworm_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Glow Worm v{}", glowworm_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Classify(args) => cli::classify::execute(args, &config),
        Commands::Video(args) => cli::video::execute(args, &config).await,
        Commands::Search(args) => cli::records::search(args, &config).await,
        Commands::Recommend(args) => cli::records::recommend(args),
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
