//! Undo/redo log of chunk mutations.

use std::fmt;

use serde::Serialize;

/// A reversible chunk mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    /// Chunk `index` was loaded into the buffer.
    Add(usize),
    /// Chunk `index` was cleared from the buffer.
    Remove(usize),
}

impl Action {
    /// The mutation that cancels this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Add(index) => Self::Remove(index),
            Self::Remove(index) => Self::Add(index),
        }
    }

    /// Chunk the action applies to.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Add(index) | Self::Remove(index) => index,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(index) => write!(f, "AddChunk {index}"),
            Self::Remove(index) => write!(f, "RemoveChunk {index}"),
        }
    }
}

/// Undo and redo stacks.
///
/// The log only stores entries; the registry executes them. `record` is for
/// fresh actions and drops the redo branch, while the `*_undo`/`*_redo`
/// helpers shuttle entries during replay without touching the other stack.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    undo: Vec<Action>,
    redo: Vec<Action>,
}

impl ActionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh action and discard the redo branch.
    pub fn record(&mut self, action: Action) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Take the most recent action to undo.
    pub fn pop_undo(&mut self) -> Option<Action> {
        self.undo.pop()
    }

    /// Take the most recently undone action.
    pub fn pop_redo(&mut self) -> Option<Action> {
        self.redo.pop()
    }

    /// Push a replayed action onto the undo stack, keeping the redo branch.
    pub fn push_undo(&mut self, action: Action) {
        self.undo.push(action);
    }

    /// Push an undone action onto the redo stack.
    pub fn push_redo(&mut self, action: Action) {
        self.redo.push(action);
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Number of entries that can be undone.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of entries that can be redone.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Entries that can be undone, oldest first.
    #[must_use]
    pub fn undo_entries(&self) -> &[Action] {
        &self.undo
    }
}
