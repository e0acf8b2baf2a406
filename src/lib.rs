// src/lib.rs

pub mod backup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, info};

use crate::backup::SystemClock;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::{BackupCore, Controller, EventLoop, StopOutcome};
use crate::errors::{BackwatchError, Result};
use crate::fs::RealFileSystem;
use crate::watch::{IgnoreFilter, NotifySource};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the backup core and event loop
/// - the notify-backed change source
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)?;
    if let Some(policy) = args.on_watch_error {
        cfg = cfg.with_on_watch_error(policy.into());
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut controller = build_controller(&cfg, NotifySource::new());
    controller.start()?;

    // The loop only ends by itself on startup failure or a closed source.
    let finished = tokio::select! {
        joined = controller.join() => Some(joined),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
    };

    let outcome = match finished {
        Some(joined) => joined?,
        None => {
            info!("interrupt received; stopping");
            controller.stop().await?
        }
    };

    match outcome {
        StopOutcome::Stopped(exit) => info!(?exit, "backwatch exiting"),
        StopOutcome::TimedOut => info!("backwatch exiting with a backup still in flight"),
        StopOutcome::NotRunning => {
            return Err(BackwatchError::Other(anyhow::anyhow!(
                "event loop was not running"
            )));
        }
    }

    Ok(())
}

/// Build a controller for the real filesystem and wall clock around the
/// given change source.
pub fn build_controller<S: watch::ChangeSource>(cfg: &ConfigFile, source: S) -> Controller<S> {
    let core = BackupCore::from_config(cfg, Arc::new(RealFileSystem), Arc::new(SystemClock));
    Controller::new(EventLoop::new(cfg, core, source))
}

/// Dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("backwatch dry-run");
    println!("  backup_base = {}", cfg.backup_base().display());
    println!("  on_watch_error = {:?}", cfg.on_watch_error());
    println!();

    println!("watch_dirs ({}):", cfg.watch_dirs().len());
    for dir in cfg.watch_dirs() {
        println!("  - {}", dir.display());
    }

    let filter = IgnoreFilter::new(cfg.ignore_patterns());
    println!("ignore_patterns ({}):", filter.patterns().len());
    for pat in filter.patterns() {
        println!("  - {pat}");
    }
    for pat in filter.rejected() {
        println!("  - {pat} (invalid; never matches)");
    }

    debug!("dry-run complete (nothing watched)");
}
