//! Sync state: the last-known common hash used for three-way comparison.
//!
//! Persists a `SyncState` JSON document at
//! `<env dir>/.env-sync-state.json`, next to the synced file.
//! Writes use the same atomic `.tmp` + rename pattern as the local file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envsync_core::SyncActor;

use crate::error::{io_err, SyncError};
use crate::writer::write_owner_only;

pub const STATE_FILE: &str = ".env-sync-state.json";

/// On-disk sync state. An absent file reads as the default (empty) record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncState {
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Hash of the text both sides held after the last successful sync.
    #[serde(default)]
    pub last_known_hash: String,
    #[serde(default)]
    pub last_sync_by: Option<SyncActor>,
    #[serde(default)]
    pub conflict_count: u64,
}

impl SyncState {
    pub fn never_synced(&self) -> bool {
        self.last_known_hash.is_empty()
    }

    /// Record a successful sync that left both sides at `hash`.
    pub fn record(&mut self, hash: String, actor: SyncActor, at: DateTime<Utc>) {
        self.last_known_hash = hash;
        self.last_sync_by = Some(actor);
        self.last_sync_time = Some(at);
    }
}

/// `<env dir>/.env-sync-state.json`
pub fn state_path(env_file: &Path) -> PathBuf {
    match env_file.parent() {
        Some(dir) => dir.join(STATE_FILE),
        None => PathBuf::from(STATE_FILE),
    }
}

/// Load the state next to `env_file`.
///
/// Returns an empty record if the file does not exist or cannot be parsed;
/// a corrupt record only costs one conflict check, not the sync.
pub fn load_at(env_file: &Path) -> Result<SyncState, SyncError> {
    let path = state_path(env_file);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SyncState::default()),
        Err(e) => return Err(io_err(&path, e)),
    };
    match serde_json::from_str::<SyncState>(&contents) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(
                "ignoring unreadable sync state {}: {e}",
                path.display()
            );
            Ok(SyncState::default())
        }
    }
}

/// Save the state next to `env_file` atomically.
pub fn save_at(env_file: &Path, state: &SyncState) -> Result<(), SyncError> {
    let path = state_path(env_file);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    write_owner_only(&tmp, json.as_bytes())?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}
