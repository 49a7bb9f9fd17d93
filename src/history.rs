//! Bounded undo history.
//!
//! Destructive engine operations push a deep copy of the board state
//! before mutating it, so the stack always holds pre-mutation states.
//! Capacity is fixed: the oldest snapshot is evicted from the bottom when
//! a push would overflow, while undo pops from the top.

use crate::model::{Combatant, CombatantId, SpellMarker};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of undo steps retained.
pub const HISTORY_CAPACITY: usize = 20;

/// A deep copy of the undoable board state.
///
/// Grid configuration and selection are intentionally excluded: undo
/// rewinds board-state changes, not view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub combatants: Vec<Combatant>,
    pub round: u32,
    pub current_turn_id: Option<CombatantId>,
    pub spell_markers: Vec<SpellMarker>,
}

/// FIFO-evicting, LIFO-popping snapshot stack.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    snapshots: VecDeque<Snapshot>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot, evicting the oldest entry when at capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.snapshots.len() >= HISTORY_CAPACITY {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Remove and return the most recent snapshot. `None` means nothing
    /// to undo; callers treat that as a no-op, not an error.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    /// Drop all history. Used by resets and scenario loads, which are
    /// documented as irreversible.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
