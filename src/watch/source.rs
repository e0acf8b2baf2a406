// src/watch/source.rs

//! The boundary between the OS notification mechanism and the event loop.
//!
//! A [`ChangeSource`] subscribes to the watch roots and hands back a
//! [`ChangeStream`]: one channel of change events and one of error
//! notifications. Either channel closing means the source is gone.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::{ChangeEvent, SubscriptionPolicy};

/// Error notification emitted by a change source.
pub type WatchError = notify::Error;

/// Receiving half handed to the event loop.
#[derive(Debug)]
pub struct ChangeStream {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<WatchError>,
}

/// Sending half kept by the source.
#[derive(Debug, Clone)]
pub struct ChangeSender {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<WatchError>,
}

impl ChangeStream {
    pub fn channel() -> (ChangeSender, ChangeStream) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        (
            ChangeSender {
                events: events_tx,
                errors: errors_tx,
            },
            ChangeStream {
                events: events_rx,
                errors: errors_rx,
            },
        )
    }
}

/// Something that can watch directories and report changes under them.
///
/// `subscribe` is called exactly once, from inside the event loop task,
/// before the loop starts waiting. The source is kept alive for as long as
/// the loop runs, so implementations may tie the lifetime of the underlying
/// OS subscription to `self`.
pub trait ChangeSource: Send + 'static {
    fn subscribe(
        &mut self,
        roots: &[PathBuf],
        policy: SubscriptionPolicy,
    ) -> Result<ChangeStream>;
}
