mod config;
mod ics;
mod normalize;
mod source;
mod store;
mod sync;

// Re-export dropcal_core types as crate::event for internal use
pub use dropcal_core as event;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dropcal")]
#[command(about = "Sync the remote drops feed into a local event store and regenerate its calendar file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed, merge it into the local store, and regenerate the calendar
    Sync {
        /// Config file to use instead of ~/.config/dropcal/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { config } => cmd_sync(config).await,
    }
}

async fn cmd_sync(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = match config_path {
        Some(path) => config::load_config_from(&path)?,
        None => config::load_config()?,
    };

    let source = source::HttpSource::new(&cfg);
    let report = sync::run(&source, &cfg.store_file(), &cfg.calendar_file()).await?;

    if !report.fetched {
        return Ok(());
    }

    println!(
        "\nDone: {} events in store ({} new, {} updated), {} in calendar.",
        report.total, report.new, report.updated, report.rendered
    );

    Ok(())
}
