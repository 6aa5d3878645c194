//! The `glowworm serve` command.

use clap::Args;
use glowworm_core::Config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides `[server].host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `[server].port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    crate::server::run(config).await
}
