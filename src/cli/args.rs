//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "livevar")]
#[command(version, about = "Inspect and watch live variable files")]
#[command(styles = clap_cargo_style())]
pub struct Cli {
    /// Settings file (defaults to the nearest livevar.toml)
    #[arg(long, global = true, env = "LIVEVAR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default livevar.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Config,

    /// Print the groups and values stored in a backing file
    Dump {
        /// Backing file (defaults to `file` from settings)
        file: Option<PathBuf>,
    },

    /// Watch a backing file and report every change
    Watch {
        /// Backing file (defaults to `file` from settings)
        file: Option<PathBuf>,

        /// Quiet period before a change is reported (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from(["livevar", "watch", "vars.json", "--debounce-ms", "20"])
            .unwrap();
        match cli.command {
            Commands::Watch { file, debounce_ms } => {
                assert_eq!(file, Some(PathBuf::from("vars.json")));
                assert_eq!(debounce_ms, Some(20));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
