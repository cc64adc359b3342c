//! Secret-store collaborator.
//!
//! The orchestrator only needs named opaque blobs. [`DirSecretStore`] keeps
//! one owner-only file per secret inside a directory; [`MemorySecretStore`]
//! keeps them in a shared in-process map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use envsync_core::config::is_valid_secret_name;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The blob does not exist. Drives the first-push path.
    #[error("secret '{name}' not found")]
    NotFound { name: String },

    #[error("invalid secret name '{name}': only letters, digits and '-' are allowed")]
    InvalidName { name: String },

    #[error("secret store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Named opaque blob storage.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Result<String, StoreError>;
    fn put(&self, name: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, name: &str) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<String>, StoreError>;

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        match self.get(name) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Secret names map to file names, so keep them to a safe alphabet.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if is_valid_secret_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            name: name.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Directory store
// ---------------------------------------------------------------------------

const SECRET_EXT: &str = "secret";

/// One `<name>.secret` file per blob.
#[derive(Debug, Clone)]
pub struct DirSecretStore {
    root: PathBuf,
}

impl DirSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn secret_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{SECRET_EXT}"))
    }
}

impl SecretStore for DirSecretStore {
    fn get(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        let path = self.secret_path(name);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(io_err(path, e)),
        }
    }

    fn put(&self, name: &str, value: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        std::fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;

        let path = self.secret_path(name);
        let tmp = self.root.join(format!("{name}.{SECRET_EXT}.tmp"));
        write_owner_only(&tmp, value.as_bytes())?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(path, e));
        }
        tracing::debug!("stored secret '{name}' in {}", self.root.display());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let path = self.secret_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(io_err(path, e)),
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SECRET_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
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
// In-memory store
// ---------------------------------------------------------------------------

/// Clones share the same map, so two managers can sync through one store.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.secrets
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, name: &str) -> Result<String, StoreError> {
        self.lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn put(&self, name: &str, value: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        self.lock()?.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.lock()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
