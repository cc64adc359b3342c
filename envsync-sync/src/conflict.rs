//! Conflict detection and resolution.
//!
//! ## Detection
//!
//! [`compare`] classifies a local/remote pair against the last-known hash:
//!
//! 1. Equal hashes → [`Comparison::Identical`].
//! 2. Local still at the last-known hash → only remote moved.
//! 3. Remote still at the last-known hash → only local moved.
//! 4. Otherwise both moved → parse both and build a [`ConflictDescriptor`].
//!    A key conflicts iff it is present on both sides with unequal values;
//!    keys unique to one side merge trivially.
//!
//! ## Resolution
//!
//! [`ConflictResolver::resolve`] applies a [`ConflictPolicy`]. Backups (for
//! `backup-then-local`, or any policy with `auto_backup`) are written before
//! anything is resolved.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use envsync_core::{codec, ConflictPolicy, EnvMap};

use crate::backup::{self, BackupPaths};
use crate::error::SyncError;
use crate::prompt::{self, KeyChoice, PromptError, Prompter};
use crate::writer::content_hash;

/// Which copy a piece of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Both sides moved away from the last-known state.
///
/// Built fresh by every detection and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDescriptor {
    pub local_hash: String,
    pub remote_hash: String,
    pub detected_at: DateTime<Utc>,
    pub local: EnvMap,
    pub remote: EnvMap,
    pub conflicting_keys: BTreeSet<String>,
}

impl ConflictDescriptor {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicting_keys.is_empty()
    }

    /// Remote overlaid by local. Lossless when no key conflicts.
    pub fn merged(&self) -> EnvMap {
        overlay(&self.remote, &self.local)
    }
}

/// Outcome of comparing the two sides with the last-known hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Identical,
    /// Only local changed; adopt local.
    LocalMoved,
    /// Only remote changed; adopt remote.
    RemoteMoved,
    Diverged(ConflictDescriptor),
}

pub fn compare(local: &str, remote: &str, last_known_hash: &str) -> Result<Comparison, SyncError> {
    let local_hash = content_hash(local);
    let remote_hash = content_hash(remote);

    if local_hash == remote_hash {
        return Ok(Comparison::Identical);
    }
    if local_hash == last_known_hash {
        return Ok(Comparison::RemoteMoved);
    }
    if remote_hash == last_known_hash {
        return Ok(Comparison::LocalMoved);
    }

    let local = codec::parse(local).map_err(|source| SyncError::Parse {
        side: Side::Local,
        source,
    })?;
    let remote = codec::parse(remote).map_err(|source| SyncError::Parse {
        side: Side::Remote,
        source,
    })?;
    let conflicting_keys = conflicting_keys(&local, &remote);

    Ok(Comparison::Diverged(ConflictDescriptor {
        local_hash,
        remote_hash,
        detected_at: Utc::now(),
        local,
        remote,
        conflicting_keys,
    }))
}

/// `Some` only when both sides moved; fast-forwards and identical pairs
/// need no reconciliation.
pub fn detect(
    local: &str,
    remote: &str,
    last_known_hash: &str,
) -> Result<Option<ConflictDescriptor>, SyncError> {
    match compare(local, remote, last_known_hash)? {
        Comparison::Diverged(descriptor) => Ok(Some(descriptor)),
        _ => Ok(None),
    }
}

/// Keys present on both sides with unequal values.
pub fn conflicting_keys(local: &EnvMap, remote: &EnvMap) -> BTreeSet<String> {
    local
        .iter()
        .filter(|(key, value)| remote.get(*key).is_some_and(|r| r != *value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// `base` with every entry of `top` written over it.
pub fn overlay(base: &EnvMap, top: &EnvMap) -> EnvMap {
    let mut out = base.clone();
    out.extend(top.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

/// Marker block embedding both values, left for a manual edit.
pub fn marker_block(local: &str, remote: &str) -> String {
    format!("<<<<<<< LOCAL\n{local}\n=======\n{remote}\n>>>>>>> REMOTE")
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Reconciled text plus what the caller should report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    pub policy: ConflictPolicy,
    pub conflicting_keys: Vec<String>,
    pub backups: Option<BackupPaths>,
}

impl Resolution {
    /// Marker output must not be published.
    pub fn has_markers(&self) -> bool {
        self.policy == ConflictPolicy::MergeMarkers && !self.conflicting_keys.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConflictResolver {
    pub policy: ConflictPolicy,
    pub backup_dir: PathBuf,
    pub auto_backup: bool,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            backup_dir: backup_dir.into(),
            auto_backup: false,
        }
    }

    pub fn with_auto_backup(mut self, auto_backup: bool) -> Self {
        self.auto_backup = auto_backup;
        self
    }

    pub fn resolve(
        &self,
        descriptor: &ConflictDescriptor,
        prompter: &mut dyn Prompter,
    ) -> Result<Resolution, SyncError> {
        let keys: Vec<String> = descriptor.conflicting_keys.iter().cloned().collect();

        if self.policy == ConflictPolicy::Manual && !keys.is_empty() && !prompter.is_interactive() {
            return Err(SyncError::ManualResolutionUnavailable { keys });
        }

        let backups = if self.policy == ConflictPolicy::BackupThenLocal || self.auto_backup {
            Some(backup::write_pair(
                &self.backup_dir,
                &descriptor.local,
                &descriptor.remote,
                descriptor.detected_at,
            )?)
        } else {
            None
        };

        if self.policy.reports_keys() && !keys.is_empty() {
            tracing::warn!("conflicting keys: {}", keys.join(", "));
        }

        let resolved = match self.policy {
            ConflictPolicy::LocalWins | ConflictPolicy::BackupThenLocal => {
                overlay(&descriptor.remote, &descriptor.local)
            }
            ConflictPolicy::RemoteWins => overlay(&descriptor.local, &descriptor.remote),
            ConflictPolicy::MergeMarkers => with_markers(descriptor),
            ConflictPolicy::Manual => resolve_manually(descriptor, prompter)?,
        };

        Ok(Resolution {
            text: codec::serialize(&resolved),
            policy: self.policy,
            conflicting_keys: keys,
            backups,
        })
    }
}

fn non_conflicting(descriptor: &ConflictDescriptor) -> EnvMap {
    descriptor
        .merged()
        .into_iter()
        .filter(|(key, _)| !descriptor.conflicting_keys.contains(key))
        .collect()
}

fn with_markers(descriptor: &ConflictDescriptor) -> EnvMap {
    let mut out = non_conflicting(descriptor);
    for key in &descriptor.conflicting_keys {
        if let (Some(l), Some(r)) = (descriptor.local.get(key), descriptor.remote.get(key)) {
            out.insert(key.clone(), marker_block(l, r));
        }
    }
    out
}

fn resolve_manually(
    descriptor: &ConflictDescriptor,
    prompter: &mut dyn Prompter,
) -> Result<EnvMap, SyncError> {
    let mut out = non_conflicting(descriptor);
    for key in &descriptor.conflicting_keys {
        let (Some(l), Some(r)) = (descriptor.local.get(key), descriptor.remote.get(key)) else {
            continue;
        };
        let value = match prompt::choose_for_key(prompter, key, l, r) {
            Ok(KeyChoice::UseLocal) => l.clone(),
            Ok(KeyChoice::UseRemote) => r.clone(),
            Ok(KeyChoice::NewValue(v)) => v,
            Err(PromptError::NotInteractive) => {
                return Err(SyncError::ManualResolutionUnavailable {
                    keys: descriptor.conflicting_keys.iter().cloned().collect(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        out.insert(key.clone(), value);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
