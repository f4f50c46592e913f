//! Bounded linear undo/redo history over whole snapshots.
//!
//! ```text
//! push(s1) push(s2) push(s3)   undo: [s1, s2, s3]  redo: []
//! undo()                        undo: [s1, s2]      redo: [s3]   -> returns s2
//! push(s4)                      undo: [s1, s2, s4]  redo: []     (branch dropped)
//! ```
//!
//! Invariants:
//! 1. `undo.len() <= max_depth` after every push; the oldest entry goes first.
//! 2. Pushing clears the redo stack.

use std::collections::VecDeque;

pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Clone)]
pub struct UndoHistory<T> {
    /// Newest at the back.
    undo: VecDeque<T>,
    /// Newest at the back.
    redo: Vec<T>,
    max_depth: usize,
}

impl<T: Clone> Default for UndoHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl<T: Clone> UndoHistory<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn push(&mut self, snapshot: T) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Move the newest entry to the redo stack and return the entry now on
    /// top of the undo stack, if any.
    pub fn undo(&mut self) -> Option<T> {
        let undone = self.undo.pop_back()?;
        self.redo.push(undone);
        self.undo.back().cloned()
    }

    /// Move the newest redo entry back onto the undo stack and return it.
    pub fn redo(&mut self) -> Option<T> {
        let restored = self.redo.pop()?;
        self.undo.push_back(restored.clone());
        Some(restored)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
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

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &T> {
        self.undo.iter()
    }
}
