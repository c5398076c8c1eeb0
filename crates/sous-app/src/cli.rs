//! CLI argument definitions for the `sous` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sous - a hands-free cooking companion with step timers and voice control.
#[derive(Parser, Debug)]
#[command(name = "sous", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the session database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start or resume cooking a recipe. Transcripts are read from stdin,
    /// one per line; lines starting with `~` are partial transcripts.
    Cook {
        /// Recipe JSON file.
        recipe: PathBuf,

        /// Discard any stored session for this recipe and start over.
        #[arg(long)]
        fresh: bool,

        /// Do not read instructions aloud.
        #[arg(long = "quiet")]
        quiet: bool,
    },
    /// Show the stored session.
    Status,
    /// Discard the stored session.
    Reset,
}

impl CliArgs {
    /// Priority: --config flag > SOUS_CONFIG env var > ~/.sous/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SOUS_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// `None` when not overridden on the command line.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sous").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sous").join("config.toml");
    }
    PathBuf::from("config.toml")
}
