// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::errors::{BackwatchError, Result};
use crate::types::{ChangeEvent, SubscriptionPolicy};
use crate::watch::source::{ChangeSource, ChangeStream};

/// [`ChangeSource`] backed by the platform's recommended `notify` watcher.
///
/// Every root is watched recursively. Dropping the source drops the watcher,
/// which closes both channels of the stream it produced.
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("subscribed", &self.watcher.is_some())
            .finish()
    }
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(
        &mut self,
        roots: &[PathBuf],
        policy: SubscriptionPolicy,
    ) -> Result<ChangeStream> {
        let (tx, stream) = ChangeStream::channel();

        // Called synchronously on notify's own thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    debug!(?event, "received notify event");
                    for change in ChangeEvent::from_notify(&event) {
                        if tx.events.send(change).is_err() {
                            // Event loop is gone.
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = tx.errors.send(err);
                }
            },
            Config::default(),
        )?;

        let mut watched = 0usize;
        for root in roots {
            match watcher.watch(root, RecursiveMode::Recursive) {
                Ok(()) => {
                    watched += 1;
                    info!(dir = ?root, "watching");
                }
                Err(err) => {
                    error!(dir = ?root, error = %err, "failed to watch directory");
                    match policy {
                        SubscriptionPolicy::Abort => {
                            return Err(BackwatchError::WatchRoot {
                                path: root.clone(),
                                reason: err.to_string(),
                            });
                        }
                        SubscriptionPolicy::Skip => {
                            warn!(dir = ?root, "skipping unwatchable directory");
                        }
                    }
                }
            }
        }

        if watched == 0 {
            return Err(BackwatchError::NothingToWatch(roots.len()));
        }

        self.watcher = Some(watcher);
        Ok(stream)
    }
}
