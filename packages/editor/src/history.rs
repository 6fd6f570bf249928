//! # Undo/Redo History
//!
//! Snapshot-based history: every significant mutation records a full
//! snapshot, undo/redo hand a snapshot back to the owner for restoring.
//!
//! ## Design
//!
//! - The undo stack's top is the *current* state; undo needs at least two
//!   entries (current + one prior)
//! - Recording clears the redo stack (linear history)
//! - Identical consecutive snapshots are dropped
//! - Each entry carries a sequence number; the save point remembers the
//!   number of the entry that was on top, so an entry popped and replaced by a
//!   new edit never matches it again
//! - While replaying, recording is suppressed; re-entering a restore is a bug
//!   and panics
//! - Records arriving within the coalescing window of the top entry's
//!   creation replace it, except across a save point, into the baseline
//!   entry, or into an entry produced by undo/redo
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(&HistoryConfig::default());
//! history.record(snapshot_0);
//! history.record(snapshot_1);
//!
//! if let Some(snapshot) = history.step_back() {
//!     history.enter_replay();
//!     restore(&snapshot);
//!     history.exit_replay();
//! }
//! ```

use std::time::{Duration, Instant};

use easel_common::HistoryConfig;

use crate::event_bus::{EventBus, Unsubscribe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Idle,
    /// The top entry still absorbs records (coalescing window open)
    Recording,
    /// A restore is in progress
    Replaying,
}

/// Emitted after every change to the stacks or the save point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub is_save_point: bool,
}

#[derive(Debug, Clone)]
struct Entry<S> {
    seq: u64,
    snapshot: S,
    created_at: Instant,
    /// Closed for coalescing
    sealed: bool,
}

pub struct History<S> {
    undo_stack: Vec<Entry<S>>,
    redo_stack: Vec<Entry<S>>,
    next_seq: u64,
    save_point: Option<u64>,
    replaying: bool,
    max_levels: usize,
    coalesce_window: Duration,
    emitter: EventBus<HistoryStatus>,
}

impl<S: Clone + PartialEq + 'static> History<S> {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            next_seq: 0,
            save_point: None,
            replaying: false,
            max_levels: config.max_levels,
            coalesce_window: Duration::from_millis(config.coalesce_window_ms),
            emitter: EventBus::new("History"),
        }
    }

    /// Record a snapshot of the current state
    pub fn record(&mut self, snapshot: S) -> bool {
        self.record_at(snapshot, Instant::now())
    }

    /// Record with an explicit timestamp (drives coalescing)
    pub fn record_at(&mut self, snapshot: S, now: Instant) -> bool {
        if self.replaying {
            tracing::trace!("record suppressed while replaying");
            return false;
        }
        if self.undo_stack.last().is_some_and(|top| top.snapshot == snapshot) {
            return false;
        }

        self.redo_stack.clear();

        if self.can_coalesce(now) {
            if let Some(top) = self.undo_stack.last_mut() {
                tracing::trace!(seq = top.seq, "coalescing into top entry");
                top.snapshot = snapshot;
            }
        } else {
            self.next_seq += 1;
            self.undo_stack.push(Entry {
                seq: self.next_seq,
                snapshot,
                created_at: now,
                sealed: false,
            });
            self.trim();
        }

        self.notify();
        true
    }

    fn can_coalesce(&self, now: Instant) -> bool {
        if self.coalesce_window.is_zero() || self.undo_stack.len() < 2 {
            return false;
        }
        let Some(top) = self.undo_stack.last() else {
            return false;
        };
        !top.sealed
            && self.save_point != Some(top.seq)
            && now.saturating_duration_since(top.created_at) <= self.coalesce_window
    }

    fn trim(&mut self) {
        if self.max_levels == 0 {
            return;
        }
        // max_levels counts undo steps; the current state sits on top of them
        let limit = self.max_levels + 1;
        if self.undo_stack.len() > limit {
            let excess = self.undo_stack.len() - limit;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the current entry and return the new top for restoring
    pub fn step_back(&mut self) -> Option<S> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);

        let top = self.undo_stack.last_mut()?;
        top.sealed = true;
        let snapshot = top.snapshot.clone();
        self.notify();
        Some(snapshot)
    }

    /// Move one entry back from the redo stack and return it for restoring
    pub fn step_forward(&mut self) -> Option<S> {
        let mut entry = self.redo_stack.pop()?;
        entry.sealed = true;
        let snapshot = entry.snapshot.clone();
        self.undo_stack.push(entry);
        self.notify();
        Some(snapshot)
    }

    /// Mark the start of a restore; panics when one is already running
    pub fn enter_replay(&mut self) {
        assert!(!self.replaying, "history restore re-entered while replaying");
        self.replaying = true;
    }

    pub fn exit_replay(&mut self) {
        self.replaying = false;
    }

    /// Remember the current top as the unmodified state
    pub fn save_point(&mut self) {
        if let Some(top) = self.undo_stack.last_mut() {
            top.sealed = true;
            self.save_point = Some(top.seq);
        }
        self.notify();
    }

    pub fn is_save_point(&self) -> bool {
        match self.undo_stack.last() {
            Some(top) => self.save_point == Some(top.seq),
            None => self.save_point.is_none(),
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn state(&self) -> HistoryState {
        if self.replaying {
            HistoryState::Replaying
        } else if self.can_coalesce(Instant::now()) {
            HistoryState::Recording
        } else {
            HistoryState::Idle
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len().saturating_sub(1)
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// The snapshot of the current state, if any was recorded
    pub fn current(&self) -> Option<&S> {
        self.undo_stack.last().map(|entry| &entry.snapshot)
    }

    /// Drop everything but the current state
    pub fn clear(&mut self) {
        let len = self.undo_stack.len();
        if len > 1 {
            self.undo_stack.drain(..len - 1);
        }
        self.redo_stack.clear();
        self.notify();
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            is_save_point: self.is_save_point(),
        }
    }

    pub fn on_change(&self, listener: impl Fn(&HistoryStatus) + 'static) -> Unsubscribe {
        self.emitter.on(listener)
    }

    fn notify(&self) {
        self.emitter.emit(&self.status());
    }
}

impl<S> std::fmt::Debug for History<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("undo_levels", &self.undo_stack.len().saturating_sub(1))
            .field("redo_levels", &self.redo_stack.len())
            .field("save_point", &self.save_point)
            .field("replaying", &self.replaying)
            .finish()
    }
}
