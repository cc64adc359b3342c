//! Pre-resolution snapshots of both sides of a conflict.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use envsync_core::{codec, EnvMap};

use crate::error::{io_err, SyncError};
use crate::writer::write_owner_only;

pub const BACKUP_DIR: &str = ".env-sync-backups";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

/// Paths of one backup pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    pub local: PathBuf,
    pub remote: PathBuf,
}

/// `<env dir>/.env-sync-backups`
pub fn backup_dir(env_file: &Path) -> PathBuf {
    match env_file.parent() {
        Some(dir) => dir.join(BACKUP_DIR),
        None => PathBuf::from(BACKUP_DIR),
    }
}

/// Write `local-<ts>.env` and `remote-<ts>.env` into `dir`, owner-only.
///
/// Both files are durable before this returns; the caller resolves only
/// afterwards.
pub fn write_pair(
    dir: &Path,
    local: &EnvMap,
    remote: &EnvMap,
    at: DateTime<Utc>,
) -> Result<BackupPaths, SyncError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    restrict_dir(dir)?;

    let stamp = at.format(TIMESTAMP_FORMAT).to_string();
    let paths = BackupPaths {
        local: dir.join(format!("local-{stamp}.env")),
        remote: dir.join(format!("remote-{stamp}.env")),
    };
    write_snapshot(&paths.local, local)?;
    write_snapshot(&paths.remote, remote)?;

    tracing::info!(
        "backed up conflict snapshots to {} and {}",
        paths.local.display(),
        paths.remote.display()
    );
    Ok(paths)
}

fn write_snapshot(path: &Path, env: &EnvMap) -> Result<(), SyncError> {
    write_owner_only(path, codec::serialize(env).as_bytes())
}

#[cfg(unix)]
fn restrict_dir(dir: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(dir, e))
}

#[cfg(not(unix))]
fn restrict_dir(_dir: &Path) -> Result<(), SyncError> {
    Ok(())
}
