//! Error types for envsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing the flat `KEY=VALUE` format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A non-blank, non-comment line had no `=`. `line` is 1-based.
    #[error("invalid env line {line}: {content}")]
    MissingSeparator { line: usize, content: String },
}

impl CodecError {
    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            CodecError::MissingSeparator { line, .. } => *line,
        }
    }
}

/// All errors that can arise from project configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `envsync init` first")]
    NotFound { path: PathBuf },

    /// The config parsed but failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// `dirs::home_dir()` returned `None` while expanding a `~/` path.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
