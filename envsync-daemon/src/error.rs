use std::path::PathBuf;

use thiserror::Error;

use crate::backend::WatchError;

/// Error surface for the change detector and its runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registering the watch failed at startup.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("sync error: {0}")]
    Sync(#[from] envsync_sync::SyncError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
