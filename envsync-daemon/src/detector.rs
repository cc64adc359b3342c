//! Change Detector: one cooperative loop per watched env file.
//!
//! The loop multiplexes cancellation, backend change events, backend errors,
//! a refresh ticker (pull) and a coarse health ticker (re-assert the watch).
//! Callbacks run synchronously inside the loop, so a push and a pull for the
//! same file never overlap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use envsync_core::ProjectConfig;
use envsync_sync::prompt::{confirm_push, ConfirmOutcome};
use envsync_sync::{Prompter, SyncError, TerminalPrompter};

use crate::backend::{ChangeEvent, ChangeKind, WatchBackend, WatchError, WatchStreams};
use crate::error::DaemonError;
use crate::gate::{Admission, ChangeGate};
use crate::paths::{
    matches_target, parent_dir, DEFAULT_DEBOUNCE, DEFAULT_REFRESH_INTERVAL, GUARD_WINDOW,
    HEALTH_CHECK_INTERVAL,
};

/// Push or pull action invoked by the loop.
pub type SyncCallback = Box<dyn FnMut() -> Result<(), SyncError> + Send>;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub target: PathBuf,
    pub refresh_interval: Duration,
    pub debounce: Duration,
    pub push_enabled: bool,
    pub confirm_before_push: bool,
    pub guard_window: Duration,
    pub health_interval: Duration,
}

impl DetectorConfig {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            push_enabled: false,
            confirm_before_push: false,
            guard_window: GUARD_WINDOW,
            health_interval: HEALTH_CHECK_INTERVAL,
        }
    }

    /// Target and intervals taken from a loaded project config.
    pub fn from_project(config: &ProjectConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.sync_interval_secs),
            debounce: Duration::from_secs(config.debounce_secs),
            ..Self::new(config.env_file.clone())
        }
    }

    pub fn push_enabled(mut self, enabled: bool) -> Self {
        self.push_enabled = enabled;
        self
    }

    pub fn confirm_before_push(mut self, confirm: bool) -> Self {
        self.confirm_before_push = confirm;
        self
    }

    fn validate(&self) -> Result<(), DaemonError> {
        for (name, value) in [
            ("refresh interval", self.refresh_interval),
            ("health check interval", self.health_interval),
        ] {
            if value.is_zero() {
                return Err(DaemonError::Runtime(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Cancels a running detector.
#[derive(Debug, Clone)]
pub struct DetectorHandle {
    shutdown: broadcast::Sender<()>,
}

impl DetectorHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }
}

pub struct ChangeDetector<B: WatchBackend> {
    session: Session<B>,
    streams: WatchStreams,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Everything the loop mutates besides its channels.
struct Session<B> {
    config: DetectorConfig,
    backend: B,
    gate: ChangeGate,
    on_local_change: SyncCallback,
    on_refresh_tick: SyncCallback,
    prompter: Box<dyn Prompter>,
}

impl<B: WatchBackend> ChangeDetector<B> {
    pub fn new(
        config: DetectorConfig,
        backend: B,
        streams: WatchStreams,
        on_local_change: SyncCallback,
        on_refresh_tick: SyncCallback,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);
        Self {
            session: Session {
                gate: ChangeGate::new(config.debounce, config.guard_window),
                config,
                backend,
                on_local_change,
                on_refresh_tick,
                prompter: Box::new(TerminalPrompter),
            },
            streams,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Prompter used for the push confirmation gate.
    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.session.prompter = prompter;
        self
    }

    pub fn handle(&self) -> DetectorHandle {
        DetectorHandle {
            shutdown: self.shutdown_tx.clone(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.session.config.target
    }

    /// Watch until stopped. Only a failure to register the initial watch on
    /// the target is returned as an error.
    pub async fn run(self) -> Result<(), DaemonError> {
        let ChangeDetector {
            mut session,
            streams,
            shutdown_tx: _keepalive,
            mut shutdown_rx,
        } = self;
        let WatchStreams {
            mut events,
            mut errors,
        } = streams;

        session.config.validate()?;
        session.register()?;
        tracing::info!(
            target_file = %session.config.target.display(),
            push = session.config.push_enabled,
            confirm = session.config.confirm_before_push,
            refresh_secs = session.config.refresh_interval.as_secs(),
            "watching env file",
        );

        let mut refresh = tokio::time::interval(session.config.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        refresh.tick().await; // consume the first immediate tick

        let mut health = tokio::time::interval(session.config.health_interval);
        health.set_missed_tick_behavior(MissedTickBehavior::Skip);
        health.tick().await;

        let mut events_open = true;
        let mut errors_open = true;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = events.recv(), if events_open => match event {
                    Some(event) => session.handle_event(event),
                    None => {
                        tracing::warn!("watch event stream closed");
                        events_open = false;
                    }
                },
                err = errors.recv(), if errors_open => match err {
                    Some(err) => tracing::warn!(error = %err, "watch error"),
                    None => errors_open = false,
                },
                _ = refresh.tick() => session.refresh(),
                _ = health.tick() => session.health_check(),
            }
        }

        session.release();
        tracing::info!(target_file = %session.config.target.display(), "stopped watching");
        Ok(())
    }
}

impl<B: WatchBackend> Session<B> {
    fn register(&mut self) -> Result<(), DaemonError> {
        let target = self.config.target.clone();
        match self.backend.watch(&target) {
            Ok(()) | Err(WatchError::AlreadyWatching { .. }) => {}
            Err(err) => return Err(err.into()),
        }
        // Rename-over saves are only visible on the parent directory.
        if let Some(dir) = parent_dir(&target) {
            if let Err(err) = self.backend.watch(&dir) {
                tracing::warn!(dir = %dir.display(), error = %err, "could not watch parent directory");
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        let target = self.config.target.clone();
        let mut paths = vec![target.clone()];
        paths.extend(parent_dir(&target));
        for path in paths {
            if let Err(err) = self.backend.unwatch(&path) {
                tracing::debug!(path = %path.display(), error = %err, "unwatch on shutdown");
            }
        }
    }

    fn handle_event(&mut self, event: ChangeEvent) {
        let target = self.config.target.clone();
        if !matches_target(&event.path, &target) {
            return;
        }
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "change event");

        let exact = event.path == target;
        match event.kind {
            // A rename-save reports the old inode's removal after the new
            // file is already in place.
            ChangeKind::Remove if exact && target.exists() => self.rewatch(&target),
            ChangeKind::Remove if exact => {
                // The watch went with the inode; re-added on create.
                if let Err(err) = self.backend.unwatch(&target) {
                    tracing::debug!(error = %err, "unwatch removed target");
                }
            }
            ChangeKind::Create | ChangeKind::Rename if exact => self.rewatch(&target),
            _ => {}
        }

        if !event.kind.qualifies() {
            return;
        }
        match self.gate.admit(Instant::now()) {
            Admission::Accepted => self.publish_local_change(),
            Admission::Guarded => {
                tracing::debug!("change inside guard window after refresh, not pushing");
            }
            Admission::Debounced => tracing::trace!("change debounced"),
        }
    }

    fn rewatch(&mut self, target: &Path) {
        if let Err(err) = self.backend.unwatch(target) {
            tracing::debug!(error = %err, "unwatch before rewatch");
        }
        match self.backend.watch(target) {
            Ok(()) | Err(WatchError::AlreadyWatching { .. }) => {
                tracing::debug!(target_file = %target.display(), "watch re-registered");
            }
            Err(err) => {
                tracing::warn!(target_file = %target.display(), error = %err, "re-registering watch failed");
            }
        }
    }

    fn publish_local_change(&mut self) {
        let path = self.config.target.display().to_string();
        if !self.config.push_enabled {
            tracing::info!(target_file = %path, "local change detected (push disabled)");
            return;
        }
        if self.config.confirm_before_push {
            match confirm_push(self.prompter.as_mut(), &path) {
                Ok(ConfirmOutcome::Confirmed) => {}
                Ok(ConfirmOutcome::Declined) => {
                    tracing::info!(target_file = %path, "push declined");
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "push confirmation unavailable, skipping push");
                    return;
                }
            }
        }
        match (self.on_local_change)() {
            Ok(()) => tracing::info!(target_file = %path, "local change pushed"),
            Err(err) => tracing::error!(error = %err, "push after local change failed"),
        }
    }

    fn refresh(&mut self) {
        self.gate.record_refresh(Instant::now());
        match (self.on_refresh_tick)() {
            Ok(()) => tracing::debug!("refresh completed"),
            Err(err) => tracing::error!(error = %err, "refresh failed"),
        }
    }

    fn health_check(&mut self) {
        let target = self.config.target.clone();
        match self.backend.watch(&target) {
            Ok(()) => tracing::info!(target_file = %target.display(), "watch restored"),
            Err(WatchError::AlreadyWatching { .. }) => tracing::trace!("watch healthy"),
            Err(err) => tracing::warn!(
                target_file = %target.display(),
                error = %err,
                "watch health check failed, retrying next interval",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use envsync_sync::ScriptedPrompter;
    use tokio::sync::mpsc;
    use tokio::time::advance;

    const TARGET: &str = "/srv/app/.env";

    #[derive(Clone, Default)]
    struct FakeBackend {
        watched: Arc<Mutex<HashSet<PathBuf>>>,
        calls: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<HashSet<PathBuf>>>,
    }

    struct Feed {
        events: mpsc::UnboundedSender<ChangeEvent>,
        errors: mpsc::UnboundedSender<WatchError>,
    }

    impl FakeBackend {
        fn new() -> (Self, WatchStreams, Feed) {
            let (event_tx, events) = mpsc::unbounded_channel();
            let (error_tx, errors) = mpsc::unbounded_channel();
            (
                Self::default(),
                WatchStreams { events, errors },
                Feed {
                    events: event_tx,
                    errors: error_tx,
                },
            )
        }

        fn fail(&self, path: &str) {
            self.failing.lock().unwrap().insert(PathBuf::from(path));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl WatchBackend for FakeBackend {
        fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
            if self.failing.lock().unwrap().contains(path) {
                return Err(WatchError::Backend(format!("cannot watch {}", path.display())));
            }
            if !self.watched.lock().unwrap().insert(path.to_path_buf()) {
                return Err(WatchError::AlreadyWatching {
                    path: path.to_path_buf(),
                });
            }
            self.calls.lock().unwrap().push(format!("watch {}", path.display()));
            Ok(())
        }

        fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
            if !self.watched.lock().unwrap().remove(path) {
                return Err(WatchError::NotWatching {
                    path: path.to_path_buf(),
                });
            }
            self.calls.lock().unwrap().push(format!("unwatch {}", path.display()));
            Ok(())
        }
    }

    fn counter() -> (Arc<AtomicUsize>, SyncCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let callback: SyncCallback = Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (count, callback)
    }

    fn config() -> DetectorConfig {
        DetectorConfig {
            refresh_interval: Duration::from_secs(60),
            ..DetectorConfig::new(TARGET)
        }
        .push_enabled(true)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn write(feed: &Feed, path: &str, kind: ChangeKind) {
        feed.events.send(ChangeEvent::new(path, kind)).unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn remove_then_create_rewatches_and_pushes_once() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend.clone(), streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;
        assert_eq!(backend.calls(), vec!["watch /srv/app/.env", "watch /srv/app"]);

        write(&feed, TARGET, ChangeKind::Remove);
        settle().await;
        advance(Duration::from_millis(400)).await;
        write(&feed, TARGET, ChangeKind::Create);
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        advance(Duration::from_millis(300)).await;
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;

        assert_eq!(pushes.load(Ordering::SeqCst), 1);
        assert_eq!(
            backend.calls()[2..],
            ["unwatch /srv/app/.env", "watch /srv/app/.env"]
        );

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn late_remove_after_rename_save_keeps_target_watched() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join(".env");
        std::fs::write(&target, "A=1\n").unwrap();
        let target_str = target.to_str().unwrap();

        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let cfg = DetectorConfig {
            refresh_interval: Duration::from_secs(60),
            ..DetectorConfig::new(&target)
        }
        .push_enabled(true);
        let detector = ChangeDetector::new(cfg, backend.clone(), streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        // The new file lands first; the old inode's removal trails it.
        write(&feed, target_str, ChangeKind::Rename);
        write(&feed, target_str, ChangeKind::Remove);
        settle().await;

        assert!(backend.watched.lock().unwrap().contains(&target));
        assert_eq!(
            backend.calls().last().map(String::as_str),
            Some(format!("watch {target_str}").as_str())
        );
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn write_shortly_after_refresh_is_not_pushed() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(pulls.load(Ordering::SeqCst), 1);

        advance(Duration::from_secs(1)).await;
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);

        advance(GUARD_WINDOW).await;
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn failing_callbacks_do_not_stop_the_loop() {
        let (backend, streams, feed) = FakeBackend::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let on_change: SyncCallback = Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::LocalMissing {
                path: PathBuf::from(TARGET),
            })
        });
        let on_tick: SyncCallback = Box::new(|| {
            Err(SyncError::ManualResolutionUnavailable {
                keys: vec!["A".to_string()],
            })
        });
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        advance(Duration::from_secs(6)).await;
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        feed.errors
            .send(WatchError::Backend("queue overflow".to_string()))
            .unwrap();
        advance(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!task.is_finished());

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn stop_releases_watches_and_silences_callbacks() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend.clone(), streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        handle.stop();
        task.await.unwrap().unwrap();
        assert!(backend.watched.lock().unwrap().is_empty());

        let _ = feed.events.send(ChangeEvent::new(TARGET, ChangeKind::Write));
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn stop_before_run_returns_immediately() {
        let (backend, streams, _feed) = FakeBackend::new();
        let (_pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        detector.handle().stop();
        detector.run().await.unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn target_watch_failure_at_startup_is_fatal() {
        let (backend, streams, _feed) = FakeBackend::new();
        backend.fail(TARGET);
        let (_pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        let err = detector.run().await.unwrap_err();
        assert!(matches!(err, DaemonError::Watch(WatchError::Backend(_))));
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn parent_watch_failure_is_tolerated() {
        let (backend, streams, feed) = FakeBackend::new();
        backend.fail("/srv/app");
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn health_check_restores_a_dropped_watch() {
        let (backend, streams, _feed) = FakeBackend::new();
        let (_pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let mut cfg = config();
        cfg.refresh_interval = Duration::from_secs(3600);
        let detector = ChangeDetector::new(cfg, backend.clone(), streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        backend.watched.lock().unwrap().remove(Path::new(TARGET));
        advance(HEALTH_CHECK_INTERVAL).await;
        settle().await;
        assert!(backend.watched.lock().unwrap().contains(Path::new(TARGET)));
        assert_eq!(backend.calls().last().map(String::as_str), Some("watch /srv/app/.env"));

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn confirmation_gate_respects_answers() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(
            config().confirm_before_push(true),
            backend,
            streams,
            on_change,
            on_tick,
        )
        .with_prompter(Box::new(ScriptedPrompter::new(["n", "y"])));
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);

        advance(Duration::from_secs(6)).await;
        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn confirmation_without_terminal_skips_push() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(
            config().confirm_before_push(true),
            backend,
            streams,
            on_change,
            on_tick,
        )
        .with_prompter(Box::new(ScriptedPrompter::non_interactive()));
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, TARGET, ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn push_disabled_still_refreshes() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (pulls, on_tick) = counter();
        let detector =
            ChangeDetector::new(config().push_enabled(false), backend, streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, TARGET, ChangeKind::Write);
        advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);
        assert_eq!(pulls.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn unrelated_files_and_kinds_are_ignored() {
        let (backend, streams, feed) = FakeBackend::new();
        let (pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let detector = ChangeDetector::new(config(), backend, streams, on_change, on_tick);
        let handle = detector.handle();
        let task = tokio::spawn(detector.run());
        settle().await;

        write(&feed, "/srv/app/.env.swp", ChangeKind::Write);
        write(&feed, "/srv/app/other", ChangeKind::Create);
        write(&feed, TARGET, ChangeKind::Other);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 0);

        // Canonicalised path with the same base name still counts.
        write(&feed, "/private/srv/app/.env", ChangeKind::Write);
        settle().await;
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        handle.stop();
        task.await.unwrap().unwrap();
    }

    #[test]
    fn detector_config_follows_project_intervals() {
        let mut project =
            ProjectConfig::new("team-env", "/srv/vault", envsync_core::KeySource::Env);
        project.env_file = PathBuf::from(TARGET);
        project.sync_interval_secs = 120;
        project.debounce_secs = 2;

        let cfg = DetectorConfig::from_project(&project);
        assert_eq!(cfg.target, PathBuf::from(TARGET));
        assert_eq!(cfg.refresh_interval, Duration::from_secs(120));
        assert_eq!(cfg.debounce, Duration::from_secs(2));
        assert!(!cfg.push_enabled);
    }

    #[tokio::test]
    async fn zero_refresh_interval_is_rejected() {
        let (backend, streams, _feed) = FakeBackend::new();
        let (_pushes, on_change) = counter();
        let (_pulls, on_tick) = counter();
        let mut cfg = config();
        cfg.refresh_interval = Duration::ZERO;
        let detector = ChangeDetector::new(cfg, backend, streams, on_change, on_tick);
        assert!(matches!(detector.run().await, Err(DaemonError::Runtime(_))));
    }
}
