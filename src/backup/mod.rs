// src/backup/mod.rs

//! Copying changed files into timestamped snapshot directories.
//!
//! A backup of `<root>/<rel>` taken at time `t` lands at
//! `<backup_base>/<YYYY-MM-DD_HH-MM-SS>/<rel>`, where `<root>` is the first
//! configured watch root containing the file.

use std::fmt::Debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::BackupError;
use crate::fs::FileSystem;
use crate::watch::path_utils::resolve_root;

/// `chrono` format of a snapshot directory name, second precision.
pub const SNAPSHOT_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Snapshot directory name for the given local time.
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format(SNAPSHOT_FORMAT).to_string()
}

/// Source of "now" for snapshot names.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Copies source files under the configured watch roots into snapshots.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    backup_base: PathBuf,
    roots: Arc<[PathBuf]>,
    fs: Arc<dyn FileSystem>,
}

impl BackupWriter {
    pub fn new(
        backup_base: impl Into<PathBuf>,
        roots: impl Into<Arc<[PathBuf]>>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            backup_base: backup_base.into(),
            roots: roots.into(),
            fs,
        }
    }

    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(cfg.backup_base(), cfg.watch_dirs().to_vec(), fs)
    }

    pub fn backup_base(&self) -> &Path {
        &self.backup_base
    }

    /// Destination a backup of `src_path` taken at `now` would be written to.
    pub fn destination(&self, src_path: &Path, now: NaiveDateTime) -> Result<PathBuf, BackupError> {
        let resolved = resolve_root(self.fs.as_ref(), src_path, &self.roots)?;
        Ok(self
            .backup_base
            .join(format_timestamp(now))
            .join(resolved.relative))
    }

    /// Copy `src_path` into the snapshot for `now` and return where it went.
    ///
    /// A copy that fails midway leaves the partially written destination in
    /// place. Both file handles are dropped on every return path.
    pub fn backup(&self, src_path: &Path, now: NaiveDateTime) -> Result<PathBuf, BackupError> {
        let dest = self.destination(src_path, now)?;

        if let Some(parent) = dest.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|source| BackupError::DirCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut reader = self
            .fs
            .open_read(src_path)
            .map_err(|source| BackupError::SourceOpen {
                path: src_path.to_path_buf(),
                source,
            })?;

        let mut writer = self
            .fs
            .create(&dest)
            .map_err(|source| BackupError::DestCreate {
                path: dest.clone(),
                source,
            })?;

        let copy_err = |source: io::Error| BackupError::Copy {
            src: src_path.to_path_buf(),
            dest: dest.clone(),
            source,
        };
        let bytes = io::copy(&mut reader, &mut writer).map_err(copy_err)?;
        writer.flush().map_err(copy_err)?;

        debug!(src = ?src_path, dest = ?dest, bytes, "copied file");
        Ok(dest)
    }
}
