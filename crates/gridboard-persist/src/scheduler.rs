//! The debounce state machine.
//!
//! `idle → saving → saved`, or `saving → error`. Any qualifying transition
//! (including undo/redo) moves the machine to `saving` and re-arms the
//! quiet-period deadline, cancelling a pending one — only the newest
//! document snapshot is ever written, intermediate states never reach
//! storage.
//!
//! The machine never reads a clock: callers pass `Instant`s in
//! (`note_transition`, `poll`), so a test can replay any burst pattern
//! exactly. Real-time wrappers that call `Instant::now()` live in the store
//! facade, not here.
//!
//! # Invariants
//!
//! 1. A deadline is pending iff state is `Saving`.
//! 2. `poll` reports a given deadline at most once.
//! 3. A failed write leaves the durable value untouched and the machine in
//!    `Error`; the next qualifying transition retries the full cycle.

use std::fmt;
use std::time::{Duration, Instant};

use crate::store::StorageError;

/// Default quiet period before a burst of transitions is persisted.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Persistence status for UI feedback.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SaveState {
    /// Nothing to persist.
    #[default]
    Idle,
    /// Transitions observed; a save is pending or in flight.
    Saving,
    /// Last write succeeded.
    Saved,
    /// Last write failed; will retry on the next qualifying transition.
    Error,
}

impl SaveState {
    /// Stable string form for logs and status lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SaveState::Idle => "idle",
            SaveState::Saving => "saving",
            SaveState::Saved => "saved",
            SaveState::Error => "error",
        }
    }
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler tuning.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Quiet period that must elapse after the last qualifying transition
    /// before the snapshot is written.
    pub quiet_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl SchedulerConfig {
    /// Override the quiet period.
    #[must_use]
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}

/// Snapshot of the scheduler for UI feedback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveStatus {
    /// Current machine state.
    pub state: SaveState,
    /// Epoch-ms timestamp of the last successful write.
    pub last_saved_ms: Option<u64>,
    /// Human-readable reason for the last failure, if any.
    pub last_error: Option<String>,
}

/// The debounce machine. Owned and driven by the store facade.
#[derive(Debug)]
pub struct SaveScheduler {
    config: SchedulerConfig,
    state: SaveState,
    deadline: Option<Instant>,
    last_saved_ms: Option<u64>,
    last_error: Option<String>,
}

impl SaveScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SaveState::Idle,
            deadline: None,
            last_saved_ms: None,
            last_error: None,
        }
    }

    /// A qualifying transition happened at `now`: enter `Saving` and re-arm
    /// the deadline, superseding any pending one.
    pub fn note_transition(&mut self, now: Instant) {
        self.state = SaveState::Saving;
        self.deadline = Some(now + self.config.quiet_period);
    }

    /// Check the deadline. Returns `true` exactly once per armed deadline,
    /// when `now` has reached it — the caller must then write the *current*
    /// snapshot and report back via [`complete`](Self::complete).
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Record the outcome of the write that [`poll`](Self::poll) requested.
    pub fn complete(&mut self, result: Result<(), StorageError>, now_ms: u64) {
        // A transition that arrived while the write was in flight has
        // already re-armed the deadline; it wins the state race.
        let write_pending = self.deadline.is_some();
        match result {
            Ok(()) => {
                self.last_saved_ms = Some(now_ms);
                self.last_error = None;
                if !write_pending {
                    self.state = SaveState::Saved;
                }
                tracing::debug!(at_ms = now_ms, "document snapshot persisted");
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                if !write_pending {
                    self.state = SaveState::Error;
                }
                tracing::warn!(error = %err, "document snapshot write failed");
            }
        }
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Whether a deadline is armed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Epoch-ms timestamp of the last successful write.
    #[must_use]
    pub fn last_saved_ms(&self) -> Option<u64> {
        self.last_saved_ms
    }

    /// Status snapshot for UI feedback.
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        SaveStatus {
            state: self.state,
            last_saved_ms: self.last_saved_ms,
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(100);

    fn scheduler() -> SaveScheduler {
        SaveScheduler::new(SchedulerConfig::default().with_quiet_period(QUIET))
    }

    fn io_err() -> StorageError {
        StorageError::Unavailable("quota exceeded".into())
    }

    #[test]
    fn starts_idle_with_nothing_pending() {
        let mut s = scheduler();
        assert_eq!(s.state(), SaveState::Idle);
        assert!(!s.poll(Instant::now()));
    }

    #[test]
    fn transition_arms_deadline_after_quiet_period() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_transition(t0);
        assert_eq!(s.state(), SaveState::Saving);

        assert!(!s.poll(t0 + QUIET / 2), "deadline must not fire early");
        assert!(s.poll(t0 + QUIET));
        assert!(!s.poll(t0 + QUIET * 2), "a deadline fires at most once");
    }

    #[test]
    fn burst_coalesces_to_one_deadline() {
        let mut s = scheduler();
        let t0 = Instant::now();
        let step = Duration::from_millis(30);

        // Five transitions, each inside the previous quiet window.
        for i in 0..5u32 {
            s.note_transition(t0 + step * i);
            assert!(!s.poll(t0 + step * i), "no deadline fires mid-burst");
        }

        let last = t0 + step * 4;
        assert!(!s.poll(last + QUIET - Duration::from_millis(1)));
        assert!(s.poll(last + QUIET), "exactly one deadline, after the burst");
        assert!(!s.poll(last + QUIET * 3));
    }

    #[test]
    fn successful_write_moves_to_saved() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_transition(t0);
        assert!(s.poll(t0 + QUIET));

        s.complete(Ok(()), 42_000);
        assert_eq!(s.state(), SaveState::Saved);
        assert_eq!(s.last_saved_ms(), Some(42_000));
        assert!(s.status().last_error.is_none());
    }

    #[test]
    fn failed_write_moves_to_error_and_retries() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_transition(t0);
        assert!(s.poll(t0 + QUIET));

        s.complete(Err(io_err()), 42_000);
        assert_eq!(s.state(), SaveState::Error);
        assert!(s.status().last_error.unwrap().contains("quota"));
        assert_eq!(s.last_saved_ms(), None);

        // Next qualifying transition retries the full cycle.
        let t1 = t0 + Duration::from_secs(1);
        s.note_transition(t1);
        assert_eq!(s.state(), SaveState::Saving);
        assert!(s.poll(t1 + QUIET));
        s.complete(Ok(()), 43_000);
        assert_eq!(s.state(), SaveState::Saved);
        assert_eq!(s.last_saved_ms(), Some(43_000));
    }

    #[test]
    fn transition_during_write_keeps_machine_saving() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_transition(t0);
        assert!(s.poll(t0 + QUIET));

        // While the write is in flight, another transition re-arms.
        s.note_transition(t0 + QUIET + Duration::from_millis(1));
        s.complete(Ok(()), 42_000);
        assert_eq!(
            s.state(),
            SaveState::Saving,
            "pending work outranks the completed write"
        );
        assert_eq!(s.last_saved_ms(), Some(42_000));
    }

    #[test]
    fn status_snapshot_reflects_machine() {
        let mut s = scheduler();
        assert_eq!(s.status(), SaveStatus::default());

        let t0 = Instant::now();
        s.note_transition(t0);
        assert_eq!(s.status().state, SaveState::Saving);
    }

    #[test]
    fn state_strings_are_stable() {
        assert_eq!(SaveState::Idle.as_str(), "idle");
        assert_eq!(SaveState::Saving.as_str(), "saving");
        assert_eq!(SaveState::Saved.as_str(), "saved");
        assert_eq!(SaveState::Error.as_str(), "error");
    }
}
