use anyhow::anyhow;
use clap::Parser;

use livevar::Settings;

mod cli;

use cli::{Cli, Commands, commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow!("invalid configuration: {e}"))?;

    livevar::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => commands::run_init(force),
        Commands::Config => commands::run_config(&settings),
        Commands::Dump { file } => {
            let path = file.unwrap_or_else(|| settings.file.clone());
            commands::run_dump(&path)
        }
        Commands::Watch { file, debounce_ms } => {
            let path = file.unwrap_or_else(|| settings.file.clone());
            let debounce_ms = debounce_ms.unwrap_or(settings.watch.debounce_ms);
            commands::run_watch(&path, debounce_ms)
        }
    }
}
