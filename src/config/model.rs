// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::SubscriptionPolicy;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// backup_base = "/var/backups/backwatch"
/// watch_dirs = ["/home/me/notes", "/home/me/projects"]
/// ignore_patterns = ["*.tmp", "*.swp", ".#*"]
/// on_watch_error = "skip"
/// ```
///
/// Only `backup_base` and `watch_dirs` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Root directory under which every snapshot directory is created.
    pub backup_base: String,

    /// Directories to watch, in resolution order.
    pub watch_dirs: Vec<String>,

    /// Glob patterns matched against the base filename of each change.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Policy when a watch root cannot be subscribed.
    #[serde(default)]
    pub on_watch_error: SubscriptionPolicy,
}

/// Validated, normalized configuration.
///
/// All paths are absolute. Constructed once at startup through
/// `TryFrom<RawConfigFile>` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    backup_base: PathBuf,
    watch_dirs: Vec<PathBuf>,
    ignore_patterns: Vec<String>,
    on_watch_error: SubscriptionPolicy,
}

impl ConfigFile {
    /// Build a `ConfigFile` without running validation.
    ///
    /// Callers are expected to have validated and normalized the inputs.
    pub(crate) fn new_unchecked(
        backup_base: PathBuf,
        watch_dirs: Vec<PathBuf>,
        ignore_patterns: Vec<String>,
        on_watch_error: SubscriptionPolicy,
    ) -> Self {
        Self {
            backup_base,
            watch_dirs,
            ignore_patterns,
            on_watch_error,
        }
    }

    pub fn backup_base(&self) -> &Path {
        &self.backup_base
    }

    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore_patterns
    }

    pub fn on_watch_error(&self) -> SubscriptionPolicy {
        self.on_watch_error
    }

    /// Return a copy with a different subscription policy (CLI override).
    pub fn with_on_watch_error(mut self, policy: SubscriptionPolicy) -> Self {
        self.on_watch_error = policy;
        self
    }
}
