//! `envsync watch [--push] [--confirm]`: run the change detector in the
//! foreground until Ctrl-C.

use anyhow::{Context, Result};
use clap::Args;

use envsync_daemon::{start_blocking, ChangeDetector, DetectorConfig, NotifyBackend, SyncCallback};
use envsync_sync::SyncManager;

use super::sync::print_report;
use super::{load_project, resolve_key};
use crate::GlobalArgs;

/// Arguments for `envsync watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Push local edits as they happen (pull-only otherwise).
    #[arg(long)]
    pub push: bool,

    /// Ask before every push.
    #[arg(long, requires = "push")]
    pub confirm: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

impl WatchArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let project = load_project(globals)?;
        let key = resolve_key(globals, &project)?;
        let secret = project.secret_name.clone();

        // The target must exist before a watch can be registered on it.
        if !project.env_file.exists() {
            let report = SyncManager::from_config(&project, key.clone())
                .pull()
                .with_context(|| format!("initial pull of '{secret}' failed"))?;
            print_report(&secret, &report);
        }

        let mut pusher = SyncManager::from_config(&project, key.clone());
        let push_secret = secret.clone();
        let on_local_change: SyncCallback = Box::new(move || {
            let report = pusher.push()?;
            print_report(&push_secret, &report);
            Ok(())
        });

        let mut puller = SyncManager::from_config(&project, key);
        let pull_secret = secret.clone();
        let on_refresh_tick: SyncCallback = Box::new(move || {
            let report = puller.pull()?;
            print_report(&pull_secret, &report);
            Ok(())
        });

        let (backend, streams) = NotifyBackend::new().context("failed to start file watcher")?;
        let config = DetectorConfig::from_project(&project)
            .push_enabled(self.push)
            .confirm_before_push(self.confirm);
        let detector = ChangeDetector::new(config, backend, streams, on_local_change, on_refresh_tick);

        println!(
            "Watching {} for '{}' (push {}). Press Ctrl-C to stop.",
            project.env_file.display(),
            secret,
            if self.push { "on" } else { "off" },
        );
        start_blocking(detector).context("watcher exited with error")?;
        Ok(())
    }
}
