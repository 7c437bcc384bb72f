use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tonewiki",
    about = "MinorBugs music theory wiki: server and store administration",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML server configuration; defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a filesystem store at this directory, overriding the config.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the web server
    Serve(ServeArgs),
    /// List wiki pages
    Pages(PagesArgs),
    /// Upload a page (.md), an image (.png, .jpg, .jpeg) or a zip of images
    Upload(UploadArgs),
    /// List comments
    Comments,
    /// Give every page a row in the popularity table
    SyncPopularity,
    /// Show a user's history, most recent first
    History(HistoryArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding the config.
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct PagesArgs {
    #[arg(long)]
    pub by_popularity: bool,
}

#[derive(Args)]
pub struct UploadArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub username: String,
}
