//! CLI definitions for Tickwork.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tickwork CLI.
#[derive(Parser)]
#[command(name = "tickwork")]
#[command(about = "In-process recurring job engine")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the configured jobs until Ctrl-C (default)
    Run {
        /// Shut down after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Validate the configuration and exit
    Check,

    /// List the built-in job kinds
    Kinds,
}
