pub mod diff;
pub mod init;
pub mod keygen;
pub mod status;
pub mod sync;
pub mod watch;

use anyhow::{Context, Result};

use envsync_core::config::{self, KEY_ENV_VAR};
use envsync_core::ProjectConfig;
use envsync_sync::{load_key, EncryptionKey, SyncManager};

use crate::GlobalArgs;

pub(crate) fn load_project(globals: &GlobalArgs) -> Result<ProjectConfig> {
    config::load_at(&globals.sync_file)
        .with_context(|| format!("failed to load {}", globals.sync_file.display()))
}

pub(crate) fn resolve_key(globals: &GlobalArgs, project: &ProjectConfig) -> Result<EncryptionKey> {
    load_key(project, globals.key.as_deref(), std::env::var(KEY_ENV_VAR).ok())
        .context("failed to load encryption key")
}

/// Config, key and a terminal-backed manager in one step.
pub(crate) fn open_manager(globals: &GlobalArgs) -> Result<(ProjectConfig, SyncManager)> {
    let project = load_project(globals)?;
    let key = resolve_key(globals, &project)?;
    let manager = SyncManager::from_config(&project, key);
    Ok((project, manager))
}
