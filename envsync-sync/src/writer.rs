//! Content hashing and atomic local writes.
//!
//! ## `write_local` protocol
//!
//! 1. Ensure the parent directory exists.
//! 2. Write to `<path>.envsync.tmp`, created owner-only (never readable by
//!    others, even briefly).
//! 3. Rename over the final path (atomic on POSIX).
//! 4. On rename failure, remove the `.tmp` file and leave the original intact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// SHA-256 of `text`, lowercase hex.
pub fn content_hash(text: &str) -> String {
    let mut h = Sha256::new();
    h.update(text.as_bytes());
    hex::encode(h.finalize())
}

/// Read the local file; `None` if it does not exist.
pub fn read_local(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Replace the local file with `text`, atomically and owner-only.
pub fn write_local(path: &Path, text: &str) -> Result<(), SyncError> {
    write_local_with_tmp(path, text, &tmp_path(path))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.envsync.tmp", path.display()))
}

fn write_local_with_tmp(path: &Path, text: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    write_owner_only(tmp, text.as_bytes())?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

/// Create or truncate `path` with mode 0600 and write `bytes` durably.
///
/// The mode is applied at open time, and again on the handle before any
/// bytes land so a stale file left by an earlier run is narrowed too.
pub(crate) fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| io_err(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| io_err(path, e))?;
    }
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
