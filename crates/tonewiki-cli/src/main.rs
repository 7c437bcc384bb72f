use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

const DEFAULT_FILTER: &str = "tonewiki=info,tower_http=info";

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("tonewiki=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    commands::run_command(cli)
}
