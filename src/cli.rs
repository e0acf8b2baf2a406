// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::SubscriptionPolicy;

/// Command-line arguments for `backwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backwatch",
    version,
    about = "Copy changed files into timestamped backup snapshots.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Backwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// What to do when a watch directory cannot be watched.
    ///
    /// Overrides `on_watch_error` from the config file.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_watch_error: Option<WatchErrorPolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BACKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print it, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Subscription failure policy as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum WatchErrorPolicy {
    Abort,
    Skip,
}

impl From<WatchErrorPolicy> for SubscriptionPolicy {
    fn from(p: WatchErrorPolicy) -> Self {
        match p {
            WatchErrorPolicy::Abort => SubscriptionPolicy::Abort,
            WatchErrorPolicy::Skip => SubscriptionPolicy::Skip,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
