use std::path::PathBuf;

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use serde::Deserialize;

/// What to do when subscribing to one of the configured watch roots fails.
///
/// - `Abort`: startup fails and the event loop exits with an error (default).
/// - `Skip`: log the failing root and keep watching the others. If no root
///   could be subscribed at all, startup still fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPolicy {
    #[default]
    Abort,
    Skip,
}

/// Operation kind of a filesystem change, reduced to what the backup engine
/// cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Write,
    Other,
}

impl ChangeKind {
    /// Only file creations and content writes trigger a backup.
    pub fn triggers_backup(self) -> bool {
        matches!(self, ChangeKind::Create | ChangeKind::Write)
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            // Directories are mirrored implicitly when files inside them are copied.
            EventKind::Create(CreateKind::Folder) => ChangeKind::Other,
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                ChangeKind::Write
            }
            // A file moved into place (or over an existing one) is new content.
            EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
                ChangeKind::Create
            }
            _ => ChangeKind::Other,
        }
    }
}

/// A single change notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a `notify` event into one `ChangeEvent` per affected path.
    ///
    /// A paired rename carries `[from, to]`; only the destination counts as
    /// a creation.
    pub fn from_notify(event: &notify::Event) -> Vec<ChangeEvent> {
        if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
            return event
                .paths
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let kind = if i == 1 {
                        ChangeKind::Create
                    } else {
                        ChangeKind::Other
                    };
                    ChangeEvent::new(p.clone(), kind)
                })
                .collect();
        }

        let kind = ChangeKind::from(&event.kind);
        event
            .paths
            .iter()
            .map(|p| ChangeEvent::new(p.clone(), kind))
            .collect()
    }
}
