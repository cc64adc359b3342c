//! envsync core library: domain types, the `KEY=VALUE` codec, project
//! configuration, errors.
//!
//! Public API surface:
//! - [`types`]: policies, actors and the [`EnvMap`] snapshot type
//! - [`codec`]: parse / serialize the flat env format
//! - [`config`]: load / save / validate `.env-sync.yaml`
//! - [`error`]: [`CodecError`], [`ConfigError`]

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use config::ProjectConfig;
pub use error::{CodecError, ConfigError};
pub use types::{ConflictPolicy, EnvMap, KeySource, SyncActor};
