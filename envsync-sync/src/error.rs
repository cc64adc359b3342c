//! Error types for envsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use envsync_core::{CodecError, ConfigError};

use crate::cipher::CipherError;
use crate::conflict::Side;
use crate::prompt::PromptError;
use crate::store::StoreError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One side's text is not valid `KEY=VALUE`; conflict detection aborted.
    #[error("failed to parse {side} content: {source}")]
    Parse {
        side: Side,
        #[source]
        source: CodecError,
    },

    /// Push needs a local file to publish.
    #[error("local file {path} does not exist; run pull first")]
    LocalMissing { path: PathBuf },

    /// The local file would be published but does not parse.
    #[error("refusing to publish {path}: {source}")]
    InvalidLocal {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Secret-store failure (network, auth, missing blob on pull).
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),

    /// Encryption or decryption failure. Never falls back to plaintext.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// The manual policy was selected but nobody can answer the prompts.
    #[error(
        "conflict on {} key(s) ({}) requires manual resolution, but no interactive terminal is available",
        keys.len(),
        keys.join(", ")
    )]
    ManualResolutionUnavailable { keys: Vec<String> },

    /// Reading an answer from the terminal failed.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// The decrypted remote blob is not UTF-8 text.
    #[error("remote secret '{name}' does not decrypt to UTF-8 text")]
    RemoteNotUtf8 { name: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sync state JSON serialization error.
    #[error("sync state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
