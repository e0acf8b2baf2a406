// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Compiling ignore patterns and matching them against changed filenames.
//! - Resolving a changed path to the watch root that contains it.
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind the
//!   [`ChangeSource`] trait so the event loop can be driven by fakes in tests.
//!
//! It does **not** copy anything; that is the job of [`crate::backup`].

pub mod path_utils;
pub mod patterns;
pub mod source;
pub mod watcher;

pub use path_utils::{clean_path, relative_to, resolve_root, ResolvedPath};
pub use patterns::IgnoreFilter;
pub use source::{ChangeSender, ChangeSource, ChangeStream, WatchError};
pub use watcher::NotifySource;
