// src/engine/core.rs

//! Synchronous per-event processing.
//!
//! [`decide`] is pure: it only looks at the event kind and the ignore
//! patterns. [`BackupCore::process`] applies the decision and performs the
//! copy; it blocks on file IO and is run by the event loop on the blocking
//! thread pool.

use std::sync::Arc;

use tracing::info;

use crate::backup::{BackupWriter, Clock};
use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::types::ChangeEvent;
use crate::watch::IgnoreFilter;

use super::EventOutcome;

/// What to do with a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDecision {
    Skip,
    Ignore,
    Backup,
}

pub fn decide(filter: &IgnoreFilter, event: &ChangeEvent) -> EventDecision {
    if !event.kind.triggers_backup() {
        EventDecision::Skip
    } else if filter.should_ignore(&event.path) {
        EventDecision::Ignore
    } else {
        EventDecision::Backup
    }
}

/// Everything needed to turn one change event into one backup attempt.
#[derive(Debug, Clone)]
pub struct BackupCore {
    filter: IgnoreFilter,
    writer: BackupWriter,
    clock: Arc<dyn Clock>,
}

impl BackupCore {
    pub fn new(filter: IgnoreFilter, writer: BackupWriter, clock: Arc<dyn Clock>) -> Self {
        Self {
            filter,
            writer,
            clock,
        }
    }

    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            IgnoreFilter::new(cfg.ignore_patterns()),
            BackupWriter::from_config(cfg, fs),
            clock,
        )
    }

    pub fn writer(&self) -> &BackupWriter {
        &self.writer
    }

    /// Process one event. Each backup gets its own snapshot timestamp taken
    /// right before the copy starts.
    pub fn process(&self, event: &ChangeEvent) -> EventOutcome {
        match decide(&self.filter, event) {
            EventDecision::Skip => EventOutcome::Skipped,
            EventDecision::Ignore => EventOutcome::Ignored,
            EventDecision::Backup => {
                info!(path = ?event.path, kind = ?event.kind, "detected change");
                match self.writer.backup(&event.path, self.clock.now()) {
                    Ok(dest) => EventOutcome::BackedUp(dest),
                    Err(err) => EventOutcome::Failed(err),
                }
            }
        }
    }
}
