// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Compiled ignore patterns, matched against the base filename of a path.
///
/// Patterns use shell-glob syntax (`*`, `?`, `[abc]`, `[!a-z]`, `{a,b}`).
/// Directory components of the changed path never take part in matching, so
/// `*.tmp` ignores `/data/deep/dir/x.tmp` and `build` ignores a file named
/// `build` anywhere under a watch root.
///
/// Patterns that fail to compile are logged once and then behave as if they
/// never match.
#[derive(Clone)]
pub struct IgnoreFilter {
    set: GlobSet,
    patterns: Vec<String>,
    rejected: Vec<String>,
}

impl fmt::Debug for IgnoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreFilter")
            .field("patterns", &self.patterns)
            .field("rejected", &self.rejected)
            .finish_non_exhaustive()
    }
}

impl IgnoreFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut accepted = Vec::with_capacity(patterns.len());
        let mut rejected = Vec::new();

        for pat in patterns {
            let pat = pat.as_ref();
            match Glob::new(pat) {
                Ok(glob) => {
                    builder.add(glob);
                    accepted.push(pat.to_string());
                }
                Err(err) => {
                    warn!(pattern = %pat, error = %err, "invalid ignore pattern; it will never match");
                    rejected.push(pat.to_string());
                }
            }
        }

        // Every glob was already validated individually.
        let set = builder.build().unwrap_or_else(|err| {
            warn!(error = %err, "failed to compile ignore patterns; nothing will be ignored");
            GlobSet::empty()
        });

        Self {
            set,
            patterns: accepted,
            rejected,
        }
    }

    /// Filter that ignores nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            patterns: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Patterns that compiled and take part in matching.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Patterns that failed to compile.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Returns true if the base filename of `path` matches any pattern.
    pub fn should_ignore(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.set.is_match(Path::new(name)),
            None => self.set.is_match(path),
        }
    }
}
