//! Domain types shared by every envsync crate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed configuration snapshot: key → value.
///
/// Ordered so that serialization is deterministic and diffable.
pub type EnvMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which operation last brought local and remote into agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncActor {
    #[default]
    Push,
    Pull,
}

impl fmt::Display for SyncActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncActor::Push => write!(f, "push"),
            SyncActor::Pull => write!(f, "pull"),
        }
    }
}

/// How to reconcile a conflict where both sides changed the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConflictPolicy {
    /// Prompt for every conflicting key.
    #[default]
    #[serde(rename = "manual")]
    Manual,
    /// Remote overlaid by local.
    #[serde(rename = "local")]
    LocalWins,
    /// Local overlaid by remote.
    #[serde(rename = "remote")]
    RemoteWins,
    /// Embed both values in marker blocks for a later manual edit.
    #[serde(rename = "merge")]
    MergeMarkers,
    /// Back up both snapshots, then resolve as [`ConflictPolicy::LocalWins`].
    #[serde(rename = "backup")]
    BackupThenLocal,
}

impl ConflictPolicy {
    pub fn all() -> &'static [ConflictPolicy] {
        &[
            ConflictPolicy::Manual,
            ConflictPolicy::LocalWins,
            ConflictPolicy::RemoteWins,
            ConflictPolicy::MergeMarkers,
            ConflictPolicy::BackupThenLocal,
        ]
    }

    /// Policies that surface the conflicting-key list for display.
    pub fn reports_keys(self) -> bool {
        matches!(self, ConflictPolicy::Manual | ConflictPolicy::MergeMarkers)
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Manual => write!(f, "manual"),
            ConflictPolicy::LocalWins => write!(f, "local"),
            ConflictPolicy::RemoteWins => write!(f, "remote"),
            ConflictPolicy::MergeMarkers => write!(f, "merge"),
            ConflictPolicy::BackupThenLocal => write!(f, "backup"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(ConflictPolicy::Manual),
            "local" | "local-wins" => Ok(ConflictPolicy::LocalWins),
            "remote" | "remote-wins" => Ok(ConflictPolicy::RemoteWins),
            "merge" | "merge-markers" => Ok(ConflictPolicy::MergeMarkers),
            "backup" | "backup-then-local" => Ok(ConflictPolicy::BackupThenLocal),
            other => Err(format!(
                "unknown conflict strategy '{other}'; expected: manual, local, remote, merge, backup"
            )),
        }
    }
}

/// Where the encryption key is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// `ENVSYNC_ENCRYPTION_KEY` environment variable (base64).
    Env,
    /// A file holding the base64 key.
    File,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Env => write!(f, "env"),
            KeySource::File => write!(f, "file"),
        }
    }
}

impl FromStr for KeySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "env" => Ok(KeySource::Env),
            "file" => Ok(KeySource::File),
            other => Err(format!("invalid key source '{other}'; expected: env, file")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
