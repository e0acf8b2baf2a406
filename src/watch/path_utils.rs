// src/watch/path_utils.rs

//! Mapping changed paths back to the watch root that contains them.

use std::path::{Component, Path, PathBuf};

use crate::errors::BackupError;
use crate::fs::FileSystem;

/// A changed path split into its matched watch root and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath<'a> {
    pub root: &'a Path,
    pub relative: PathBuf,
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component. Leading `..` on relative paths are kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    out.iter().map(|c| c.as_os_str()).collect()
}

/// Path of `path` relative to `root`, or `None` if it would have to escape
/// upward (or is the root itself).
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    let root = clean_path(root);
    let path = clean_path(path);

    let rel = path.strip_prefix(&root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(rel.to_path_buf())
}

/// Find the first root (in configured order) that contains `path`.
///
/// Lexical comparison is tried against every root first. Only if that fails
/// are the roots and the path's parent directory canonicalized and compared
/// again, which covers roots reached through symlinks (e.g. `/var` vs
/// `/private/var` on macOS). The file itself is not canonicalized, so a file
/// that vanished since the event still resolves and fails later on open.
pub fn resolve_root<'a>(
    fs: &dyn FileSystem,
    path: &Path,
    roots: &'a [PathBuf],
) -> Result<ResolvedPath<'a>, BackupError> {
    for root in roots {
        if let Some(relative) = relative_to(root, path) {
            return Ok(ResolvedPath { root, relative });
        }
    }

    if let Some(path_canon) = canonicalize_parent(fs, path) {
        for root in roots {
            let Ok(root_canon) = fs.canonicalize(root) else {
                continue;
            };
            if let Some(relative) = relative_to(&root_canon, &path_canon) {
                return Ok(ResolvedPath { root, relative });
            }
        }
    }

    Err(BackupError::NoMatchingRoot {
        path: path.to_path_buf(),
    })
}

/// Canonical parent directory of `path` joined with its file name.
fn canonicalize_parent(fs: &dyn FileSystem, path: &Path) -> Option<PathBuf> {
    let path = clean_path(path);
    let name = path.file_name()?;
    let parent = fs.canonicalize(path.parent()?).ok()?;
    Some(parent.join(name))
}
