#![forbid(unsafe_code)]

//! Bounded undo/redo envelope with gesture coalescing.
//!
//! [`History`] wraps a present value with a past/future snapshot stack. Each
//! applied transition pushes the pre-transition value onto `past` and clears
//! `future`; `past` is bounded and FIFO-evicts its oldest entry when full.
//!
//! Two policy knobs shape what counts as one undo step:
//!
//! - **Grouping**: transitions tagged [`EntryKind::Grouped`] with the same
//!   [`GroupKey`] as the currently open group coalesce — no new `past` entry
//!   is pushed, so the top of `past` stays the pre-gesture value and an
//!   entire drag becomes a single undo step. Any differently-keyed or
//!   ungrouped transition closes the group.
//! - **Standalone boundaries**: wholesale-replace transitions (import, reset)
//!   use [`EntryKind::Standalone`]. They are never coalesced into an open
//!   group and always form their own undo boundary: undoing right after one
//!   restores the value from before the replacement, redoing restores the
//!   replacement.
//!
//! # Invariants
//!
//! 1. `past.len() ≤ limit` at all times (FIFO eviction).
//! 2. `future` is empty after any non-undo/redo application.
//! 3. `undo` then `redo` restores the exact pre-undo present.
//!
//! The container is generic: it never inspects the value, so it stays
//! decoupled from the document model it snapshots.

use std::collections::VecDeque;

/// Default bound on the undo stack.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Key identifying one continuous gesture (a single drag or resize).
///
/// Callers mint a fresh key per gesture; equality is all that matters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GroupKey(pub u64);

/// How a transition participates in undo grouping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// Ordinary transition: own undo step, closes any open group.
    Normal,
    /// Part of a continuous gesture: coalesces with an open group sharing
    /// the same key.
    Grouped(GroupKey),
    /// Wholesale replacement: own undo step, never grouped.
    Standalone,
}

/// Past/present/future envelope over `T`.
#[derive(Clone, Debug)]
pub struct History<T: Clone> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
    limit: usize,
    open_group: Option<GroupKey>,
}

impl<T: Clone> History<T> {
    /// Wrap `present` with the default bound.
    #[must_use]
    pub fn new(present: T) -> Self {
        Self::with_limit(present, DEFAULT_HISTORY_LIMIT)
    }

    /// Wrap `present` with an explicit bound. A limit of zero disables undo
    /// entirely while keeping the present writable.
    #[must_use]
    pub fn with_limit(present: T, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            limit,
            open_group: None,
        }
    }

    /// The authoritative current value.
    #[must_use]
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Replace the entire envelope with a fresh present and empty stacks.
    /// Used when loading a persisted value at startup, which is not an
    /// undoable transition.
    pub fn replace_all(&mut self, present: T) {
        self.past.clear();
        self.future.clear();
        self.open_group = None;
        self.present = present;
    }

    /// Apply a transition to the present value.
    ///
    /// `mutate` receives the present by mutable reference; its return value
    /// is passed through (transitions report out-of-band results like a newly
    /// created id this way).
    pub fn apply<R>(&mut self, kind: EntryKind, mutate: impl FnOnce(&mut T) -> R) -> R {
        let coalesce = matches!(
            (kind, self.open_group),
            (EntryKind::Grouped(key), Some(open)) if key == open
        );
        if !coalesce {
            self.push_past();
        }
        self.open_group = match kind {
            EntryKind::Grouped(key) => Some(key),
            EntryKind::Normal | EntryKind::Standalone => None,
        };
        self.future.clear();
        mutate(&mut self.present)
    }

    /// Pop the latest past entry into the present. Returns `false` (no-op)
    /// when `past` is empty. Closes any open gesture group.
    pub fn undo(&mut self) -> bool {
        self.open_group = None;
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        true
    }

    /// Mirror of [`undo`](Self::undo) over `future`.
    pub fn redo(&mut self) -> bool {
        self.open_group = None;
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        // Redo re-inserts into `past`; the bound still applies.
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
        true
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of stored undo steps.
    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of stored redo steps.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    fn push_past(&mut self) {
        if self.limit == 0 {
            return;
        }
        self.past.push_back(self.present.clone());
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
