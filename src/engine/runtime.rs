// src/engine/runtime.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::types::{ChangeEvent, SubscriptionPolicy};
use crate::watch::{ChangeSource, WatchError};

use super::core::BackupCore;
use super::{EventOutcome, LoopExit};

/// The watch loop: subscribes the change source to every root, then services
/// change events, error notifications and the stop signal one at a time
/// until one of them ends it.
///
/// Per-event failures are logged and never end the loop.
pub struct EventLoop<S: ChangeSource> {
    core: Arc<BackupCore>,
    source: S,
    roots: Vec<PathBuf>,
    policy: SubscriptionPolicy,
}

impl<S: ChangeSource> fmt::Debug for EventLoop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("core", &self.core)
            .field("roots", &self.roots)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<S: ChangeSource> EventLoop<S> {
    pub fn new(cfg: &ConfigFile, core: BackupCore, source: S) -> Self {
        Self {
            core: Arc::new(core),
            source,
            roots: cfg.watch_dirs().to_vec(),
            policy: cfg.on_watch_error(),
        }
    }

    /// Run until `shutdown` fires or the source closes a channel.
    ///
    /// Fails only if subscribing to the watch roots fails under the
    /// configured policy. An in-flight copy always completes before the
    /// stop signal is observed; events still queued at that point are
    /// dropped together with the stream.
    pub async fn run(self, shutdown: CancellationToken) -> Result<LoopExit> {
        let EventLoop {
            core,
            mut source,
            roots,
            policy,
        } = self;

        let mut stream = source.subscribe(&roots, policy)?;

        info!(
            backup_base = ?core.writer().backup_base(),
            roots = roots.len(),
            "event loop started"
        );

        let exit = loop {
            tokio::select! {
                // Stop takes priority over anything already queued.
                biased;

                _ = shutdown.cancelled() => break LoopExit::Cancelled,

                event = stream.events.recv() => match event {
                    Some(event) => dispatch(&core, event).await,
                    None => {
                        warn!("change event channel closed");
                        break LoopExit::EventsClosed;
                    }
                },

                err = stream.errors.recv() => match err {
                    Some(err) => report_watch_error(&err),
                    None => {
                        warn!("watch error channel closed");
                        break LoopExit::ErrorsClosed;
                    }
                },
            }
        };

        // Unsubscribes from every root.
        drop(stream);
        drop(source);

        info!(?exit, "event loop stopped");
        Ok(exit)
    }
}

async fn dispatch(core: &Arc<BackupCore>, event: ChangeEvent) {
    let path = event.path.clone();
    let core = Arc::clone(core);

    match tokio::task::spawn_blocking(move || core.process(&event)).await {
        Ok(outcome) => report_outcome(&path, &outcome),
        Err(err) => error!(path = ?path, error = %err, "backup task panicked"),
    }
}

/// Log the outcome of one event.
fn report_outcome(path: &Path, outcome: &EventOutcome) {
    match outcome {
        EventOutcome::Skipped => trace!(path = ?path, "not a create/write event; skipped"),
        EventOutcome::Ignored => info!(path = ?path, "ignored"),
        EventOutcome::BackedUp(dest) => info!(path = ?path, dest = ?dest, "backup completed"),
        EventOutcome::Failed(err) => error!(
            path = ?path,
            reason = ?err.reason(),
            error = %err,
            "backup failed"
        ),
    }
}

fn report_watch_error(err: &WatchError) {
    if err.paths.is_empty() {
        error!(error = %err, "watch error");
    } else {
        error!(error = %err, paths = ?err.paths, "watch error");
    }
}
