//! Filesystem watch capability.
//!
//! The detector only needs `watch` / `unwatch` plus two streams: classified
//! change events and watch errors. [`NotifyBackend`] provides them on top of
//! `notify::RecommendedWatcher` (inotify, FSEvents, ReadDirectoryChangesW).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("already watching {path}")]
    AlreadyWatching { path: PathBuf },

    #[error("not watching {path}")]
    NotWatching { path: PathBuf },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("watch backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Write,
    Create,
    Rename,
    Remove,
    Other,
}

impl ChangeKind {
    /// Kinds that may mean the content changed.
    pub fn qualifies(self) -> bool {
        matches!(self, ChangeKind::Write | ChangeKind::Create | ChangeKind::Rename)
    }
}

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
}

/// Receiving ends handed to the detector with its backend.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<WatchError>,
}

pub trait WatchBackend: Send {
    /// Fails with [`WatchError::AlreadyWatching`] if `path` is registered.
    fn watch(&mut self, path: &Path) -> Result<(), WatchError>;

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError>;
}

// ---------------------------------------------------------------------------
// notify
// ---------------------------------------------------------------------------

pub struct NotifyBackend {
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl NotifyBackend {
    pub fn new() -> Result<(Self, WatchStreams), WatchError> {
        let (event_tx, events) = mpsc::unbounded_channel::<ChangeEvent>();
        let (error_tx, errors) = mpsc::unbounded_channel::<WatchError>();

        let watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                let kind = classify(&event.kind);
                for path in event.paths {
                    let _ = event_tx.send(ChangeEvent { path, kind });
                }
            }
            Err(err) => {
                let _ = error_tx.send(WatchError::Notify(err));
            }
        })?;

        Ok((
            Self {
                watcher,
                watched: HashSet::new(),
            },
            WatchStreams { events, errors },
        ))
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.watched.contains(path) {
            return Err(WatchError::AlreadyWatching {
                path: path.to_path_buf(),
            });
        }
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        if !self.watched.remove(path) {
            return Err(WatchError::NotWatching {
                path: path.to_path_buf(),
            });
        }
        // The OS may already have dropped the watch along with the inode.
        if let Err(err) = self.watcher.unwatch(path) {
            tracing::debug!(path = %path.display(), error = %err, "unwatch");
        }
        Ok(())
    }
}

pub fn classify(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Other,
        EventKind::Modify(_) => ChangeKind::Write,
        _ => ChangeKind::Other,
    }
}
