//! Read-only classification of the local/remote pair for `envsync status`.
//!
//! Precedence:
//! 1. `RemoteMissing` (no blob in the store)
//! 2. `RemoteAhead` when there is no local file
//! 3. `InSync` (identical content)
//! 4. `NeverSynced` (no last-known hash to compare against)
//! 5. `RemoteAhead` / `LocalAhead` (one side still at the last-known hash)
//! 6. `Diverged`

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use envsync_core::SyncActor;

use crate::manager::SyncManager;
use crate::state::SyncState;
use crate::writer::{content_hash, read_local};
use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    NeverSynced,
    InSync,
    LocalAhead,
    RemoteAhead,
    Diverged,
    RemoteMissing,
}

impl SyncStatus {
    /// The command that would bring the pair back in sync.
    pub fn hint(self) -> &'static str {
        match self {
            SyncStatus::NeverSynced | SyncStatus::Diverged => "run `envsync push` to reconcile",
            SyncStatus::InSync => "nothing to do",
            SyncStatus::LocalAhead | SyncStatus::RemoteMissing => "run `envsync push`",
            SyncStatus::RemoteAhead => "run `envsync pull`",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::NeverSynced => "never synced",
            SyncStatus::InSync => "in sync",
            SyncStatus::LocalAhead => "local ahead",
            SyncStatus::RemoteAhead => "remote ahead",
            SyncStatus::Diverged => "diverged",
            SyncStatus::RemoteMissing => "remote missing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: SyncStatus,
    pub env_file: String,
    pub secret_name: String,
    pub local_hash: Option<String>,
    pub remote_hash: Option<String>,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_sync_by: Option<SyncActor>,
    pub conflict_count: u64,
}

/// Classify without writing anything.
pub fn classify(local: Option<&str>, remote: Option<&str>, state: &SyncState) -> SyncStatus {
    let Some(remote) = remote else {
        return SyncStatus::RemoteMissing;
    };
    let Some(local) = local else {
        return SyncStatus::RemoteAhead;
    };

    let local_hash = content_hash(local);
    let remote_hash = content_hash(remote);
    if local_hash == remote_hash {
        return SyncStatus::InSync;
    }
    if state.never_synced() {
        return SyncStatus::NeverSynced;
    }
    if local_hash == state.last_known_hash {
        SyncStatus::RemoteAhead
    } else if remote_hash == state.last_known_hash {
        SyncStatus::LocalAhead
    } else {
        SyncStatus::Diverged
    }
}

pub fn check(manager: &SyncManager) -> Result<StatusReport, SyncError> {
    let local = read_local(manager.env_file())?;
    let remote = manager.fetch_remote()?;
    let state = manager.load_state()?;

    Ok(StatusReport {
        status: classify(local.as_deref(), remote.as_deref(), &state),
        env_file: manager.env_file().display().to_string(),
        secret_name: manager.secret_name().to_string(),
        local_hash: local.as_deref().map(content_hash),
        remote_hash: remote.as_deref().map(content_hash),
        last_sync_time: state.last_sync_time,
        last_sync_by: state.last_sync_by,
        conflict_count: state.conflict_count,
    })
}

/// Age of a timestamp as `42s`, `5m`, `3h` or `2d`.
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
