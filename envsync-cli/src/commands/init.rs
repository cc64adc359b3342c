//! `envsync init --secret-name <name> --store-dir <dir> [...]`

use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use clap::Args;

use envsync_core::config::{self, DEFAULT_DEBOUNCE_SECS, DEFAULT_ENV_FILE, DEFAULT_SYNC_INTERVAL_SECS};
use envsync_core::{ConflictPolicy, KeySource, ProjectConfig};
use envsync_sync::{AesGcmCipher, Cipher};

use super::resolve_key;
use crate::GlobalArgs;

const KEY_CHECK: &[u8] = b"envsync-init-key-check";

/// Write a validated `.env-sync.yaml`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of the remote blob (letters, digits and '-', at most 127).
    #[arg(long)]
    pub secret_name: String,

    /// Directory backing the secret store.
    #[arg(long, value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Env file to sync, relative to the config file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Where the encryption key comes from: env | file.
    #[arg(long, default_value_t = KeySource::Env)]
    pub key_source: KeySource,

    /// Key file path, required with `--key-source file`.
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// Conflict policy: manual | local | remote | merge | backup.
    #[arg(long, default_value_t = ConflictPolicy::Manual)]
    pub strategy: ConflictPolicy,

    /// Seconds between pulls in `envsync watch`.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_SYNC_INTERVAL_SECS)]
    pub interval: u64,

    /// Seconds over which rapid local saves are coalesced.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_DEBOUNCE_SECS)]
    pub debounce: u64,

    /// Back up both sides before resolving any conflict.
    #[arg(long)]
    pub auto_backup: bool,

    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let path = &globals.sync_file;
        if path.exists() && !self.force {
            bail!("{} already exists; pass --force to overwrite", path.display());
        }

        let project = ProjectConfig {
            env_file: self.env_file,
            key_file: self.key_file,
            sync_interval_secs: self.interval,
            debounce_secs: self.debounce,
            conflict_strategy: self.strategy,
            auto_backup: self.auto_backup,
            ..ProjectConfig::new(self.secret_name, self.store_dir, self.key_source)
        };
        project.validate().context("invalid init options")?;

        let resolved = project
            .clone()
            .resolve_paths(&config_dir(path))
            .context("cannot resolve configured paths")?;
        check_key(globals, &resolved)?;

        config::save_at(path, &project)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!("✓ Wrote {}", path.display());
        println!("  secret:   {}", project.secret_name);
        println!("  store:    {}", resolved.store_dir.display());
        println!("  env file: {}", resolved.env_file.display());
        println!("  strategy: {}", project.conflict_strategy);
        Ok(())
    }
}

/// Round-trip a sample through the cipher so a bad key fails at init.
fn check_key(globals: &GlobalArgs, project: &ProjectConfig) -> Result<()> {
    let key = resolve_key(globals, project)
        .context("no usable key; run `envsync generate-key` and export ENVSYNC_ENCRYPTION_KEY")?;
    let cipher = AesGcmCipher;
    let opaque = cipher.encrypt(KEY_CHECK, &key).context("test encryption failed")?;
    let plain = cipher.decrypt(&opaque, &key).context("test decryption failed")?;
    ensure!(plain == KEY_CHECK, "test encryption did not round-trip");
    Ok(())
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
