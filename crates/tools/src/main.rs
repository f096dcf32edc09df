mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Pages => commands::pages::run(&cli),
        Commands::Preferences => commands::pages::preferences(&cli),
        Commands::Cluster(args) => commands::cluster::run(&cli, args).await,
    }
}
