//! Unified diff between the remote copy and the local file for `envsync diff`.

use similar::TextDiff;

use crate::manager::SyncManager;
use crate::writer::read_local;
use crate::SyncError;

/// Remote vs local, both present or treated as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDiff {
    pub remote_exists: bool,
    pub local_exists: bool,
    /// Empty when the two texts are identical.
    pub unified_diff: String,
}

impl EnvDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Diff `remote` (old) against `local` (new). No files are written.
pub fn diff_texts(remote: &str, local: &str, secret_name: &str, env_file: &str) -> String {
    let remote = normalize_line_endings(remote);
    let local = normalize_line_endings(local);
    if remote == local {
        return String::new();
    }

    let old_header = format!("remote/{secret_name}");
    let new_header = format!("local/{env_file}");
    TextDiff::from_lines(&remote, &local)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

pub fn diff_env(manager: &SyncManager) -> Result<EnvDiff, SyncError> {
    let remote = manager.fetch_remote()?;
    let local = read_local(manager.env_file())?;
    let env_file = manager.env_file().display().to_string();

    Ok(EnvDiff {
        remote_exists: remote.is_some(),
        local_exists: local.is_some(),
        unified_diff: diff_texts(
            remote.as_deref().unwrap_or_default(),
            local.as_deref().unwrap_or_default(),
            manager.secret_name(),
            &env_file,
        ),
    })
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
