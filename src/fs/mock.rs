// src/fs/mock.rs

//! In-memory filesystem with fault injection, for exercising every failure
//! branch of the backup writer without touching disk.

use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    /// A file whose reader yields `prefix` and then fails.
    BrokenFile(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    deny_dirs: HashSet<PathBuf>,
    deny_create: HashSet<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state();
        insert_parents(&mut state.entries, &path);
        state.entries.insert(path, MockEntry::File(content.into()));
    }

    /// Add a file that fails with an IO error after yielding `prefix`.
    pub fn add_broken_file(&self, path: impl AsRef<Path>, prefix: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state();
        insert_parents(&mut state.entries, &path);
        state.entries.insert(path, MockEntry::BrokenFile(prefix.into()));
    }

    /// Make `create_dir_all` fail for `path` and everything below it.
    pub fn deny_dir_create(&self, path: impl AsRef<Path>) {
        self.state().deny_dirs.insert(path.as_ref().to_path_buf());
    }

    /// Make `create` fail for exactly `path`.
    pub fn deny_file_create(&self, path: impl AsRef<Path>) {
        self.state().deny_create.insert(path.as_ref().to_path_buf());
    }

    /// Contents of a regular file, if present.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.state().entries.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.state().entries.contains_key(path.as_ref())
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.state().entries.get(path.as_ref()), Some(MockEntry::Dir))
    }

    /// All regular files whose path starts with `prefix`, sorted.
    pub fn files_under(&self, prefix: impl AsRef<Path>) -> Vec<PathBuf> {
        let prefix = prefix.as_ref();
        let mut files: Vec<PathBuf> = self
            .state()
            .entries
            .iter()
            .filter(|(p, e)| p.starts_with(prefix) && !matches!(e, MockEntry::Dir))
            .map(|(p, _)| p.clone())
            .collect();
        files.sort();
        files
    }
}

fn insert_parents(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("no such file: {path:?}"))
}

impl FileSystem for MockFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.deny_dirs.iter().any(|d| path.starts_with(d)) {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("permission denied: {path:?}"),
            ));
        }
        if let Some(MockEntry::File(_) | MockEntry::BrokenFile(_)) = state.entries.get(path) {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("not a directory: {path:?}"),
            ));
        }
        insert_parents(&mut state.entries, &path.join("_"));
        Ok(())
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        match self.state().entries.get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::BrokenFile(prefix)) => Ok(Box::new(BrokenReader {
                inner: Cursor::new(prefix.clone()),
            })),
            Some(MockEntry::Dir) => Err(io::Error::new(
                ErrorKind::Other,
                format!("is a directory: {path:?}"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let mut state = self.state();
        if state.deny_create.contains(path) {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("permission denied: {path:?}"),
            ));
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !matches!(state.entries.get(parent), Some(MockEntry::Dir)) {
                    return Err(not_found(parent));
                }
            }
            _ => {}
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(Vec::new()));
        Ok(Box::new(MockWriter {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // No symlinks in the mock: a path is canonical if it exists.
        if self.state().entries.contains_key(path) {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(path))
        }
    }
}

struct BrokenReader {
    inner: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(ErrorKind::Other, "simulated read failure"));
        }
        Ok(n)
    }
}

/// Appends written bytes to the shared entry so partial copies stay visible.
struct MockWriter {
    state: Arc<Mutex<MockState>>,
    path: PathBuf,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match state.entries.get_mut(&self.path) {
            Some(MockEntry::File(content)) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(not_found(&self.path)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
