//! Debounce and guard-window decisions for qualifying change events.
//!
//! The gate is pure: callers pass `now`, so tests drive it with tokio's
//! paused clock.

use std::time::Duration;

use tokio::time::Instant;

use crate::paths::{DEFAULT_DEBOUNCE, GUARD_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Inside the guard window after a refresh; presumed pull-induced.
    Guarded,
    /// Within the debounce interval of the last accepted change.
    Debounced,
}

#[derive(Debug, Clone)]
pub struct ChangeGate {
    debounce: Duration,
    guard: Duration,
    last_accepted: Option<Instant>,
    last_refresh: Option<Instant>,
}

impl Default for ChangeGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, GUARD_WINDOW)
    }
}

impl ChangeGate {
    pub fn new(debounce: Duration, guard: Duration) -> Self {
        Self {
            debounce,
            guard,
            last_accepted: None,
            last_refresh: None,
        }
    }

    /// Arm the guard window.
    pub fn record_refresh(&mut self, now: Instant) {
        self.last_refresh = Some(now);
    }

    pub fn admit(&mut self, now: Instant) -> Admission {
        if let Some(refreshed) = self.last_refresh {
            if now.saturating_duration_since(refreshed) < self.guard {
                return Admission::Guarded;
            }
        }
        if let Some(accepted) = self.last_accepted {
            if now.saturating_duration_since(accepted) <= self.debounce {
                return Admission::Debounced;
            }
        }
        self.last_accepted = Some(now);
        Admission::Accepted
    }
}
