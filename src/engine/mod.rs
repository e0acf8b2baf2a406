// src/engine/mod.rs

//! The change-detection-and-backup engine.
//!
//! This module ties together:
//! - the per-event decision and backup step ([`core`])
//! - the async event loop that waits on change events, error notifications
//!   and the stop signal ([`runtime`])
//! - starting and stopping that loop as a background task ([`lifecycle`])

use std::path::PathBuf;

use crate::errors::BackupError;

/// Result of processing one change event.
#[derive(Debug)]
pub enum EventOutcome {
    /// Not a create/write event.
    Skipped,
    /// Filename matched an ignore pattern.
    Ignored,
    /// Copied; carries the destination path.
    BackedUp(PathBuf),
    Failed(BackupError),
}

/// Why the event loop left the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop was requested through the shutdown token.
    Cancelled,
    /// The change-event channel closed.
    EventsClosed,
    /// The error-notification channel closed.
    ErrorsClosed,
}

pub mod core;
pub mod lifecycle;
pub mod runtime;

pub use core::{decide, BackupCore, EventDecision};
pub use lifecycle::{Controller, HostService, StopOutcome, STOP_TIMEOUT};
pub use runtime::EventLoop;
