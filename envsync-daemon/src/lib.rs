//! # envsync-daemon
//!
//! Change Detector for one env file: a watch backend feeding a single
//! event loop that pushes debounced local edits and pulls on a timer.
//!
//! Build a [`ChangeDetector`] from a [`DetectorConfig`], a [`WatchBackend`]
//! (usually [`NotifyBackend`]) and two callbacks, then drive it with
//! [`ChangeDetector::run`] or [`start_blocking`].

pub mod backend;
pub mod detector;
mod error;
pub mod gate;
pub mod paths;
mod runtime;

pub use backend::{ChangeEvent, ChangeKind, NotifyBackend, WatchBackend, WatchError, WatchStreams};
pub use detector::{ChangeDetector, DetectorConfig, DetectorHandle, SyncCallback};
pub use error::DaemonError;
pub use gate::{Admission, ChangeGate};
pub use runtime::{init_tracing, run_until_ctrl_c, start_blocking};
