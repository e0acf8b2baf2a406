// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BackwatchError, Result};
use crate::watch::path_utils::clean_path;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BackwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let backup_base = absolutize(Path::new(raw.backup_base.trim()))?;
        let watch_dirs = normalize_watch_dirs(&raw.watch_dirs)?;
        reject_backup_base_under_roots(&backup_base, &watch_dirs)?;
        warn_on_nested_roots(&watch_dirs);

        Ok(ConfigFile::new_unchecked(
            backup_base,
            watch_dirs,
            raw.ignore_patterns,
            raw.on_watch_error,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backup_base.trim().is_empty() {
        return Err(BackwatchError::ConfigError(
            "backup_base must not be empty".to_string(),
        ));
    }

    if cfg.watch_dirs.is_empty() {
        return Err(BackwatchError::ConfigError(
            "watch_dirs must contain at least one directory".to_string(),
        ));
    }

    if let Some(idx) = cfg.watch_dirs.iter().position(|d| d.trim().is_empty()) {
        return Err(BackwatchError::ConfigError(format!(
            "watch_dirs[{idx}] must not be empty"
        )));
    }

    Ok(())
}

/// Make every root absolute and reject duplicates, keeping configured order.
fn normalize_watch_dirs(dirs: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let abs = absolutize(Path::new(dir.trim()))?;
        if !seen.insert(abs.clone()) {
            return Err(BackwatchError::ConfigError(format!(
                "watch_dirs contains duplicate entry '{dir}'"
            )));
        }
        out.push(abs);
    }

    Ok(out)
}

/// Roots are watched recursively, so copies written below a root would be
/// reported as changes and copied again.
fn reject_backup_base_under_roots(backup_base: &Path, dirs: &[PathBuf]) -> Result<()> {
    match dirs.iter().find(|root| backup_base.starts_with(root)) {
        Some(root) => Err(BackwatchError::ConfigError(format!(
            "backup_base {backup_base:?} must not be inside watch directory {root:?}"
        ))),
        None => Ok(()),
    }
}

/// Lexically absolutize a path against the current working directory.
///
/// Symlinks are not resolved; roots that do not exist yet stay valid here and
/// fail later at subscription time.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    Ok(clean_path(&abs))
}

fn warn_on_nested_roots(dirs: &[PathBuf]) {
    for (i, outer) in dirs.iter().enumerate() {
        for inner in dirs.iter().skip(i + 1) {
            if inner.starts_with(outer) || outer.starts_with(inner) {
                warn!(
                    first = ?outer,
                    second = ?inner,
                    "overlapping watch roots; changes resolve to the first configured root"
                );
            }
        }
    }
}
