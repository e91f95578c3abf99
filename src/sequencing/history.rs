//! Undo/redo over whole-sequence snapshots.
//!
//! Call [`History::push`] with the sequence as it is *before* an edit.
//! Undo and redo swap the caller's current sequence with a stored one.

use std::collections::VecDeque;

use super::Sequence;

/// Snapshots kept before the oldest is discarded.
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<Sequence>,
    redo: Vec<Sequence>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `before` as an undo point. Clears the redo stack.
    pub fn push(&mut self, before: &Sequence) {
        self.undo.push_back(before.clone());
        if self.undo.len() > MAX_HISTORY {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back. `current` is kept for redo; returns the sequence to restore.
    pub fn undo(&mut self, current: &Sequence) -> Option<Sequence> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &Sequence) -> Option<Sequence> {
        let next = self.redo.pop()?;
        self.undo.push_back(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}
