// src/errors.rs

//! Crate-wide error types.
//!
//! [`BackwatchError`] covers startup and lifecycle failures. [`BackupError`]
//! covers the per-event failures of a single backup attempt; those are logged
//! by the event loop and never escape it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to watch directory {path:?}: {reason}")]
    WatchRoot { path: PathBuf, reason: String },

    #[error("none of the {0} configured watch roots could be watched")]
    NothingToWatch(usize),

    #[error("event loop already started")]
    AlreadyStarted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BackwatchError>;

/// Category of a failed backup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFailureReason {
    NoMatchingRoot,
    DirCreateError,
    SourceOpenError,
    DestCreateError,
    CopyError,
}

/// Failure of a single backup attempt, carrying the offending path.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("failed to determine watch root for {path:?}")]
    NoMatchingRoot { path: PathBuf },

    #[error("failed to create backup directory {path:?}: {source}")]
    DirCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open source file {path:?}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create destination file {path:?}: {source}")]
    DestCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {src:?} to {dest:?}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    pub fn reason(&self) -> BackupFailureReason {
        match self {
            BackupError::NoMatchingRoot { .. } => BackupFailureReason::NoMatchingRoot,
            BackupError::DirCreate { .. } => BackupFailureReason::DirCreateError,
            BackupError::SourceOpen { .. } => BackupFailureReason::SourceOpenError,
            BackupError::DestCreate { .. } => BackupFailureReason::DestCreateError,
            BackupError::Copy { .. } => BackupFailureReason::CopyError,
        }
    }
}
