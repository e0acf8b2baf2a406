use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, Notify};

use backwatch::errors::{BackwatchError, Result};
use backwatch::types::{ChangeEvent, ChangeKind, SubscriptionPolicy};
use backwatch::watch::{ChangeSource, ChangeStream, WatchError};

#[derive(Default)]
struct Shared {
    events: Option<mpsc::UnboundedSender<ChangeEvent>>,
    errors: Option<mpsc::UnboundedSender<WatchError>>,
    subscribed: Option<Vec<PathBuf>>,
    dropped: bool,
}

/// In-memory change source.
///
/// The event loop subscribes it like the real watcher; tests then push
/// events and errors through the paired [`SourceHandle`]. Roots registered
/// with [`ChannelSource::fail_on`] refuse subscription.
pub struct ChannelSource {
    shared: Arc<Mutex<Shared>>,
    notify: Arc<Notify>,
    failing: HashSet<PathBuf>,
}

/// Test-side handle to a [`ChannelSource`].
#[derive(Clone)]
pub struct SourceHandle {
    shared: Arc<Mutex<Shared>>,
    notify: Arc<Notify>,
}

impl ChannelSource {
    pub fn new() -> (ChannelSource, SourceHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let notify = Arc::new(Notify::new());
        (
            ChannelSource {
                shared: Arc::clone(&shared),
                notify: Arc::clone(&notify),
                failing: HashSet::new(),
            },
            SourceHandle { shared, notify },
        )
    }

    pub fn fail_on(mut self, root: impl AsRef<Path>) -> Self {
        self.failing.insert(root.as_ref().to_path_buf());
        self
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|p| p.into_inner())
}

impl ChangeSource for ChannelSource {
    fn subscribe(
        &mut self,
        roots: &[PathBuf],
        policy: SubscriptionPolicy,
    ) -> Result<ChangeStream> {
        let mut watched = Vec::new();
        for root in roots {
            if self.failing.contains(root) {
                match policy {
                    SubscriptionPolicy::Abort => {
                        self.notify.notify_one();
                        return Err(BackwatchError::WatchRoot {
                            path: root.clone(),
                            reason: "refused by test source".to_string(),
                        });
                    }
                    SubscriptionPolicy::Skip => continue,
                }
            }
            watched.push(root.clone());
        }

        if watched.is_empty() {
            self.notify.notify_one();
            return Err(BackwatchError::NothingToWatch(roots.len()));
        }

        let (tx, stream) = ChangeStream::channel();
        {
            let mut shared = lock(&self.shared);
            shared.events = Some(tx.events);
            shared.errors = Some(tx.errors);
            shared.subscribed = Some(watched);
        }
        self.notify.notify_one();
        Ok(stream)
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        let mut shared = lock(&self.shared);
        shared.events = None;
        shared.errors = None;
        shared.dropped = true;
    }
}

impl SourceHandle {
    /// Wait until the loop has called `subscribe` (successfully or not) and
    /// return the roots that were subscribed, if any.
    pub async fn wait_subscribed(&self) -> Option<Vec<PathBuf>> {
        let notified = self.notify.notified();
        {
            let shared = lock(&self.shared);
            if shared.subscribed.is_some() || shared.dropped {
                return shared.subscribed.clone();
            }
        }
        notified.await;
        lock(&self.shared).subscribed.clone()
    }

    /// Push a change event. Returns false once the loop no longer listens.
    pub fn send(&self, path: impl Into<PathBuf>, kind: ChangeKind) -> bool {
        match &lock(&self.shared).events {
            Some(tx) => tx.send(ChangeEvent::new(path, kind)).is_ok(),
            None => false,
        }
    }

    pub fn send_error(&self, err: WatchError) -> bool {
        match &lock(&self.shared).errors {
            Some(tx) => tx.send(err).is_ok(),
            None => false,
        }
    }

    /// Close the change-event channel, as a dying OS watcher would.
    pub fn close_events(&self) {
        lock(&self.shared).events = None;
    }

    pub fn close_errors(&self) {
        lock(&self.shared).errors = None;
    }

    /// Whether the loop has dropped its source.
    pub fn is_dropped(&self) -> bool {
        lock(&self.shared).dropped
    }
}
