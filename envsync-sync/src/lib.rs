//! # envsync-sync
//!
//! Conflict-aware synchronisation of a local env file with an encrypted
//! remote blob.
//!
//! Build a [`SyncManager`] from a [`envsync_core::ProjectConfig`] and an
//! [`EncryptionKey`], then call [`SyncManager::push`] or
//! [`SyncManager::pull`].

pub mod backup;
pub mod cipher;
pub mod conflict;
pub mod diff;
pub mod error;
pub mod manager;
pub mod prompt;
pub mod state;
pub mod status;
pub mod store;
pub mod writer;

pub use cipher::{load_key, AesGcmCipher, Cipher, CipherError, EncryptionKey};
pub use conflict::{detect, ConflictDescriptor, ConflictResolver, Side};
pub use error::SyncError;
pub use manager::{SyncManager, SyncOutcome, SyncReport};
pub use prompt::{ConfirmOutcome, Prompter, ScriptedPrompter, TerminalPrompter};
pub use state::SyncState;
pub use status::{StatusReport, SyncStatus};
pub use store::{DirSecretStore, MemorySecretStore, SecretStore, StoreError};
