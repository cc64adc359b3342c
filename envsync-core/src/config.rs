//! Project configuration (`.env-sync.yaml`).
//!
//! # Storage layout
//!
//! ```text
//! <project>/
//!   .env-sync.yaml             (this config, mode 0600)
//!   .env                       (the synced file, `env_file`)
//!   .env-sync-state.json       (sync state, written by envsync-sync)
//!   .env-sync-backups/         (conflict backups)
//! ```
//!
//! Relative paths inside the config resolve against the directory holding
//! the config file, not the process working directory. A leading `~/` is
//! expanded with `dirs::home_dir()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{ConflictPolicy, KeySource};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".env-sync.yaml";

/// Environment variable consulted when `key_source: env`.
pub const KEY_ENV_VAR: &str = "ENVSYNC_ENCRYPTION_KEY";

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 15 * 60;
pub const DEFAULT_DEBOUNCE_SECS: u64 = 5;

/// Longest secret name the store accepts.
pub const MAX_SECRET_NAME_LEN: usize = 127;

/// Secret names become file names in the store: ASCII letters, digits and
/// `-`, at most [`MAX_SECRET_NAME_LEN`] bytes.
pub fn is_valid_secret_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SECRET_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn default_env_file() -> PathBuf {
    PathBuf::from(DEFAULT_ENV_FILE)
}

fn default_sync_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_debounce_secs() -> u64 {
    DEFAULT_DEBOUNCE_SECS
}

/// Root of `.env-sync.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Name of the remote blob in the secret store.
    pub secret_name: String,
    /// Directory backing the file-system secret store.
    pub store_dir: PathBuf,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
    pub key_source: KeySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    #[serde(default)]
    pub conflict_strategy: ConflictPolicy,
    /// Back up both snapshots before resolving, whatever the policy.
    #[serde(default)]
    pub auto_backup: bool,
}

impl ProjectConfig {
    /// A config with every optional field at its default.
    pub fn new(secret_name: impl Into<String>, store_dir: impl Into<PathBuf>, key_source: KeySource) -> Self {
        Self {
            secret_name: secret_name.into(),
            store_dir: store_dir.into(),
            env_file: default_env_file(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            key_source,
            key_file: None,
            conflict_strategy: ConflictPolicy::default(),
            auto_backup: false,
        }
    }

    /// Check required fields and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_name.trim().is_empty() {
            return Err(ConfigError::Invalid("secret_name is required".to_string()));
        }
        if !is_valid_secret_name(&self.secret_name) {
            return Err(ConfigError::Invalid(format!(
                "secret_name '{}' must be 1-{MAX_SECRET_NAME_LEN} letters, digits or '-'",
                self.secret_name
            )));
        }
        if self.store_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store_dir is required".to_string()));
        }
        if self.env_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("env_file must not be empty".to_string()));
        }
        if self.key_source == KeySource::File && self.key_file.is_none() {
            return Err(ConfigError::Invalid(
                "key_source is 'file', but key_file is not specified".to_string(),
            ));
        }
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sync_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.debounce_secs == 0 {
            return Err(ConfigError::Invalid(
                "debounce_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Rewrite relative and `~/` paths against `base` (the config directory).
    pub fn resolve_paths(mut self, base: &Path) -> Result<Self, ConfigError> {
        self.env_file = resolve_path(base, &self.env_file)?;
        self.store_dir = resolve_path(base, &self.store_dir)?;
        if let Some(key_file) = self.key_file.take() {
            self.key_file = Some(resolve_path(base, &key_file)?);
        }
        Ok(self)
    }
}

fn resolve_path(base: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(rest) = path.strip_prefix("~") {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        return Ok(home.join(rest));
    }
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base.join(path))
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load, validate and path-resolve the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<ProjectConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: ProjectConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;

    let base = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    config.resolve_paths(&base)
}

/// Validate and save `config` atomically: `<path>.tmp` then rename.
pub fn save_at(path: &Path, config: &ProjectConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let yaml = serde_yaml::to_string(config)?;
    let tmp = tmp_path(path);
    write_owner_only(&tmp, yaml.as_bytes())?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_filled_on_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "secret_name: app-env\nstore_dir: vault\nkey_source: env\n",
        )
        .unwrap();

        let cfg = load_at(&path).unwrap();
        assert_eq!(cfg.env_file, tmp.path().join(".env"));
        assert_eq!(cfg.store_dir, tmp.path().join("vault"));
        assert_eq!(cfg.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
        assert_eq!(cfg.debounce_secs, DEFAULT_DEBOUNCE_SECS);
        assert_eq!(cfg.conflict_strategy, ConflictPolicy::Manual);
        assert!(!cfg.auto_backup);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let tmp = TempDir::new().unwrap();
        let abs = tmp.path().join("elsewhere").join(".env");
        let cfg = ProjectConfig {
            env_file: abs.clone(),
            ..ProjectConfig::new("s", "/srv/vault", KeySource::Env)
        };
        let resolved = cfg.resolve_paths(Path::new("/ignored")).unwrap();
        assert_eq!(resolved.env_file, abs);
        assert_eq!(resolved.store_dir, PathBuf::from("/srv/vault"));
    }

    #[test]
    fn file_key_source_requires_key_file() {
        let cfg = ProjectConfig::new("s", "vault", KeySource::File);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("key_file"), "got: {err}");
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let cfg = ProjectConfig {
            debounce_secs: 0,
            ..ProjectConfig::new("s", "vault", KeySource::Env)
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        let cfg = ProjectConfig {
            key_file: Some(PathBuf::from(".env-sync-key")),
            conflict_strategy: ConflictPolicy::BackupThenLocal,
            auto_backup: true,
            ..ProjectConfig::new("team-env", "vault", KeySource::File)
        };
        save_at(&path, &cfg).unwrap();

        let loaded = load_at(&path).unwrap();
        assert_eq!(loaded.secret_name, "team-env");
        assert_eq!(loaded.key_file, Some(tmp.path().join(".env-sync-key")));
        assert_eq!(loaded.conflict_strategy, ConflictPolicy::BackupThenLocal);
        assert!(loaded.auto_backup);
    }
}
