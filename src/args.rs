//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// metatune - settings screen for a Clash Meta proxy engine
#[derive(Parser, Debug, Default)]
#[command(name = "metatune")]
#[command(version)]
#[command(
    about = "Tune a Clash Meta proxy engine: configuration overrides and geo database imports",
    long_about = None
)]
pub struct Args {
    /// Keep all override edits in memory; never touch the persisted slot
    #[arg(long)]
    pub dry_run: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Application data directory holding the override slots and the
    /// engine's `clash` storage (default: XDG data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Args {
    /// Effective log level after applying `--verbose`.
    #[must_use]
    pub fn effective_log_level(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }
}
