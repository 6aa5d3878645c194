//! The `glowworm config` command.

use clap::{Args, Subcommand};
use glowworm_core::config::resolve_env_var;
use glowworm_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the file and report which providers have credentials
    Check,
}

pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => println!("{}", Config::load()?.to_toml()?),

        ConfigCommand::Path => println!("{}", Config::default_path().display()),

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Check => {
            let config = Config::load()?;
            for (service, key) in credentials(&config) {
                let state = if resolve_env_var(key).is_some() {
                    "configured"
                } else {
                    "missing"
                };
                println!("{service:<10} {state}");
            }
            println!("Configuration is valid.");
        }
    }

    Ok(())
}

/// The credential each provider needs, as written in the config.
fn credentials(config: &Config) -> [(&'static str, &str); 3] {
    let llm_key = match config.llm.provider.as_str() {
        "xai" => config.llm.xai.api_key.as_str(),
        _ => config.llm.openai.api_key.as_str(),
    };
    [
        ("llm", llm_key),
        ("sandbox", config.sandbox.api_key.as_str()),
        ("video", config.video.api_key.as_str()),
    ]
}
