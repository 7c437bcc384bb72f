use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use tonewiki_backend::{Backend, UploadOutcome};
use tonewiki_server::{ServerConfig, StorageConfig, WikiServer};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.root.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Pages(args) => cmd_pages(&open_backend(&config)?, args, &format),
        Command::Upload(args) => cmd_upload(&open_backend(&config)?, args, &format),
        Command::Comments => cmd_comments(&open_backend(&config)?, &format),
        Command::SyncPopularity => cmd_sync_popularity(&open_backend(&config)?, &format),
        Command::History(args) => cmd_history(&open_backend(&config)?, args, &format),
    }
}

fn load_config(path: Option<&Path>, root: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(root) = root {
        config.storage = StorageConfig::Fs {
            root: root.to_path_buf(),
        };
    }
    Ok(config)
}

fn open_backend(config: &ServerConfig) -> anyhow::Result<Backend> {
    if config.storage == StorageConfig::Memory {
        tracing::warn!("using the in-memory store; changes are discarded on exit");
    }
    let store = config.storage.open().context("opening store")?;
    Ok(Backend::new(store, config.wiki.clone())?)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    let server = WikiServer::new(config)?;
    println!(
        "{} tonewiki on {}",
        "▶".green().bold(),
        server.config().bind_addr.to_string().bold()
    );
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_pages(backend: &Backend, args: PagesArgs, format: &OutputFormat) -> anyhow::Result<()> {
    if args.by_popularity {
        let table = backend.ensure_all_pages_present()?;
        let ranked: Vec<(String, u64)> = table
            .sorted_names()
            .into_iter()
            .map(|name| {
                let views = table.count(&name).unwrap_or(0);
                (name, views)
            })
            .collect();
        if let OutputFormat::Json = format {
            return print_json(&ranked);
        }
        for (name, views) in &ranked {
            println!("{:>8}  {}", views.to_string().cyan(), name.bold());
        }
    } else {
        let pages = backend.list_pages()?;
        if let OutputFormat::Json = format {
            return print_json(&pages);
        }
        for name in &pages {
            println!("{}", name.bold());
        }
        println!("{} pages", pages.len().to_string().cyan());
    }
    Ok(())
}

fn cmd_upload(backend: &Backend, args: UploadArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let file_name = args
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", args.path.display()))?;
    let data = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let outcome = backend.upload(file_name, &data)?;
    if let OutputFormat::Json = format {
        return print_json(&outcome);
    }
    match outcome {
        UploadOutcome::Page { name, summarized } => {
            println!("{} Uploaded page {}", "✓".green().bold(), name.yellow());
            if summarized {
                println!("  Summary: {}", "written".green());
            } else {
                println!("  Summary: {}", "none".dimmed());
            }
        }
        UploadOutcome::Image { file_name, url } => {
            println!("{} Uploaded image {}", "✓".green().bold(), file_name.yellow());
            println!("  URL: {}", url.blue());
        }
        UploadOutcome::Archive { images, skipped } => {
            println!(
                "{} Unpacked {} images from {}",
                "✓".green().bold(),
                images.len().to_string().bold(),
                file_name.yellow()
            );
            for image in &images {
                println!("  {}  {}", image.file_name, image.url.blue());
            }
            if skipped > 0 {
                println!("  Skipped: {}", skipped.to_string().dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_comments(backend: &Backend, format: &OutputFormat) -> anyhow::Result<()> {
    let comments = backend.list_comments()?;
    if let OutputFormat::Json = format {
        return print_json(&comments);
    }
    if comments.is_empty() {
        println!("No comments.");
    }
    for comment in &comments {
        println!(
            "{}  {}: {}",
            comment.posted_at_human.dimmed(),
            comment.username.yellow(),
            comment.text
        );
    }
    Ok(())
}

fn cmd_sync_popularity(backend: &Backend, format: &OutputFormat) -> anyhow::Result<()> {
    let table = backend.ensure_all_pages_present()?;
    if let OutputFormat::Json = format {
        return print_json(&table.rows());
    }
    println!(
        "{} Popularity table has {} rows",
        "✓".green().bold(),
        table.len().to_string().bold()
    );
    Ok(())
}

fn cmd_history(backend: &Backend, args: HistoryArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut history = backend.history(&args.username)?;
    history.reverse();
    if let OutputFormat::Json = format {
        return print_json(&history);
    }
    println!("History of {}", args.username.yellow().bold());
    for entry in &history {
        println!("  {}  {}", entry.at.human().dimmed(), entry.action);
    }
    Ok(())
}
