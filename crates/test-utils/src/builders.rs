#![allow(dead_code)]

use backwatch::config::{ConfigFile, RawConfigFile};
use backwatch::types::SubscriptionPolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(backup_base: impl AsRef<std::path::Path>) -> Self {
        Self {
            config: RawConfigFile {
                backup_base: backup_base.as_ref().to_string_lossy().into_owned(),
                watch_dirs: Vec::new(),
                ignore_patterns: Vec::new(),
                on_watch_error: SubscriptionPolicy::default(),
            },
        }
    }

    pub fn watch(mut self, dir: impl AsRef<std::path::Path>) -> Self {
        self.config
            .watch_dirs
            .push(dir.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.ignore_patterns.push(pattern.to_string());
        self
    }

    pub fn on_watch_error(mut self, policy: SubscriptionPolicy) -> Self {
        self.config.on_watch_error = policy;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
