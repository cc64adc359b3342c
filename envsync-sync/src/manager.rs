//! Push/pull orchestration.
//!
//! Each operation reads the local file and the remote blob fully, decides
//! with [`conflict::compare`], writes what must change, and only then
//! rewrites the sync state. After any `Ok` result other than
//! [`SyncOutcome::MarkersWritten`] and [`SyncOutcome::LocalAhead`], the
//! local file, the remote plaintext and `last_known_hash` all agree.

use std::path::{Path, PathBuf};

use chrono::Utc;

use envsync_core::{codec, ConflictPolicy, ProjectConfig, SyncActor};

use crate::backup;
use crate::cipher::{AesGcmCipher, Cipher, EncryptionKey};
use crate::conflict::{self, Comparison, ConflictDescriptor, ConflictResolver};
use crate::error::SyncError;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::state::{self, SyncState};
use crate::store::{DirSecretStore, SecretStore, StoreError};
use crate::writer::{content_hash, read_local, write_local};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No remote blob existed; local was published as-is.
    FirstPush,
    /// Only local moved; published.
    Uploaded,
    AlreadyInSync,
    /// Pull found only local moved; nothing was written.
    LocalAhead,
    /// Only remote moved; adopted into the local file.
    FastForwardRemote,
    /// Both moved on disjoint keys; the union was written to both sides.
    Merged,
    Resolved {
        policy: ConflictPolicy,
        conflicting_keys: Vec<String>,
    },
    /// Marker text written locally only; edit the file and push again.
    MarkersWritten { conflicting_keys: Vec<String> },
    /// Pull with no local file.
    CreatedLocal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Hash of the local file after the operation.
    pub hash: String,
    pub conflict_count: u64,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Drives push and pull for one local file / remote blob pair.
///
/// At most one manager may operate on a given pair at a time; nothing here
/// locks.
pub struct SyncManager {
    env_file: PathBuf,
    secret_name: String,
    store: Box<dyn SecretStore>,
    cipher: Box<dyn Cipher>,
    key: EncryptionKey,
    resolver: ConflictResolver,
    prompter: Box<dyn Prompter>,
}

impl SyncManager {
    pub fn new(
        config: &ProjectConfig,
        store: Box<dyn SecretStore>,
        cipher: Box<dyn Cipher>,
        key: EncryptionKey,
    ) -> Self {
        let resolver = ConflictResolver::new(
            config.conflict_strategy,
            backup::backup_dir(&config.env_file),
        )
        .with_auto_backup(config.auto_backup);
        Self {
            env_file: config.env_file.clone(),
            secret_name: config.secret_name.clone(),
            store,
            cipher,
            key,
            resolver,
            prompter: Box::new(TerminalPrompter),
        }
    }

    /// Directory store at `config.store_dir`, AES-256-GCM, terminal prompts.
    pub fn from_config(config: &ProjectConfig, key: EncryptionKey) -> Self {
        Self::new(
            config,
            Box::new(DirSecretStore::new(&config.store_dir)),
            Box::new(AesGcmCipher),
            key,
        )
    }

    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn prompter(&mut self) -> &mut dyn Prompter {
        self.prompter.as_mut()
    }

    pub fn load_state(&self) -> Result<SyncState, SyncError> {
        state::load_at(&self.env_file)
    }

    /// Decrypted remote text; `None` if the blob does not exist.
    pub fn fetch_remote(&self) -> Result<Option<String>, SyncError> {
        match self.store.get(&self.secret_name) {
            Ok(opaque) => self.decrypt(&opaque).map(Some),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // push
    // -----------------------------------------------------------------------

    pub fn push(&mut self) -> Result<SyncReport, SyncError> {
        let local = read_local(&self.env_file)?.ok_or_else(|| SyncError::LocalMissing {
            path: self.env_file.clone(),
        })?;
        codec::parse(&local).map_err(|source| SyncError::InvalidLocal {
            path: self.env_file.clone(),
            source,
        })?;

        let Some(remote) = self.fetch_remote()? else {
            tracing::info!("no remote secret '{}', publishing first copy", self.secret_name);
            self.upload(&local)?;
            let mut state = self.load_state()?;
            return self.finish(&mut state, SyncOutcome::FirstPush, &local, SyncActor::Push);
        };

        let mut state = self.load_state()?;
        match conflict::compare(&local, &remote, &state.last_known_hash)? {
            Comparison::Identical => {
                tracing::debug!("push: {} already in sync", self.env_file.display());
                self.finish(&mut state, SyncOutcome::AlreadyInSync, &local, SyncActor::Push)
            }
            Comparison::LocalMoved => {
                self.upload(&local)?;
                self.finish(&mut state, SyncOutcome::Uploaded, &local, SyncActor::Push)
            }
            Comparison::RemoteMoved => {
                tracing::info!("push: remote moved while local did not; adopting remote");
                write_local(&self.env_file, &remote)?;
                self.finish(&mut state, SyncOutcome::FastForwardRemote, &remote, SyncActor::Push)
            }
            Comparison::Diverged(descriptor) => {
                self.reconcile(&mut state, &descriptor, SyncActor::Push)
            }
        }
    }

    // -----------------------------------------------------------------------
    // pull
    // -----------------------------------------------------------------------

    pub fn pull(&mut self) -> Result<SyncReport, SyncError> {
        let opaque = self.store.get(&self.secret_name)?;
        let remote = self.decrypt(&opaque)?;
        let mut state = self.load_state()?;

        let Some(local) = read_local(&self.env_file)? else {
            tracing::info!("pull: creating {}", self.env_file.display());
            write_local(&self.env_file, &remote)?;
            return self.finish(&mut state, SyncOutcome::CreatedLocal, &remote, SyncActor::Pull);
        };

        match conflict::compare(&local, &remote, &state.last_known_hash)? {
            Comparison::Identical => {
                tracing::debug!("pull: {} already in sync", self.env_file.display());
                self.finish(&mut state, SyncOutcome::AlreadyInSync, &local, SyncActor::Pull)
            }
            Comparison::RemoteMoved => {
                write_local(&self.env_file, &remote)?;
                self.finish(&mut state, SyncOutcome::FastForwardRemote, &remote, SyncActor::Pull)
            }
            Comparison::LocalMoved => {
                tracing::info!("pull: local changes not yet pushed; leaving {}", self.env_file.display());
                Ok(SyncReport {
                    outcome: SyncOutcome::LocalAhead,
                    hash: content_hash(&local),
                    conflict_count: state.conflict_count,
                })
            }
            Comparison::Diverged(descriptor) => {
                self.reconcile(&mut state, &descriptor, SyncActor::Pull)
            }
        }
    }

    // -----------------------------------------------------------------------
    // helpers
    // -----------------------------------------------------------------------

    fn reconcile(
        &mut self,
        state: &mut SyncState,
        descriptor: &ConflictDescriptor,
        actor: SyncActor,
    ) -> Result<SyncReport, SyncError> {
        if !descriptor.has_conflicts() {
            tracing::info!("{actor}: both sides changed disjoint keys; merging");
            let text = codec::serialize(&descriptor.merged());
            self.publish_resolved(descriptor, &text)?;
            return self.finish(state, SyncOutcome::Merged, &text, actor);
        }

        tracing::warn!(
            "{actor}: conflict on {} key(s) in {}",
            descriptor.conflicting_keys.len(),
            self.env_file.display()
        );
        let resolution = self.resolver.resolve(descriptor, self.prompter.as_mut())?;
        state.conflict_count += 1;

        if resolution.has_markers() {
            write_local(&self.env_file, &resolution.text)?;
            // The markers already account for remote, so the next push after
            // the user's edit is a fast-forward.
            state.last_known_hash = descriptor.remote_hash.clone();
            state::save_at(&self.env_file, state)?;
            tracing::warn!(
                "conflict markers written to {}; edit the file and push again",
                self.env_file.display()
            );
            return Ok(SyncReport {
                outcome: SyncOutcome::MarkersWritten {
                    conflicting_keys: resolution.conflicting_keys,
                },
                hash: content_hash(&resolution.text),
                conflict_count: state.conflict_count,
            });
        }

        self.publish_resolved(descriptor, &resolution.text)?;
        let outcome = SyncOutcome::Resolved {
            policy: resolution.policy,
            conflicting_keys: resolution.conflicting_keys,
        };
        self.finish(state, outcome, &resolution.text, actor)
    }

    /// Write `text` locally and remotely, skipping whichever side already
    /// holds it.
    fn publish_resolved(&self, descriptor: &ConflictDescriptor, text: &str) -> Result<(), SyncError> {
        let hash = content_hash(text);
        if hash != descriptor.local_hash {
            write_local(&self.env_file, text)?;
        }
        if hash != descriptor.remote_hash {
            self.upload(text)?;
        }
        Ok(())
    }

    fn upload(&self, text: &str) -> Result<(), SyncError> {
        let opaque = self.cipher.encrypt(text.as_bytes(), &self.key)?;
        self.store.put(&self.secret_name, &opaque)?;
        tracing::info!("uploaded {} to '{}'", self.env_file.display(), self.secret_name);
        Ok(())
    }

    fn decrypt(&self, opaque: &str) -> Result<String, SyncError> {
        let plaintext = self.cipher.decrypt(opaque, &self.key)?;
        String::from_utf8(plaintext).map_err(|_| SyncError::RemoteNotUtf8 {
            name: self.secret_name.clone(),
        })
    }

    fn finish(
        &self,
        state: &mut SyncState,
        outcome: SyncOutcome,
        text: &str,
        actor: SyncActor,
    ) -> Result<SyncReport, SyncError> {
        let hash = content_hash(text);
        state.record(hash.clone(), actor, Utc::now());
        state::save_at(&self.env_file, state)?;
        Ok(SyncReport {
            outcome,
            hash,
            conflict_count: state.conflict_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
