//! Undo/redo history with keyed freeze batching.
//!
//! Snapshot stack with a cursor: `record` pushes a snapshot and truncates any
//! redo tail. A freeze taken under a key suppresses intermediate snapshots —
//! used during in-progress drags so one gesture does not produce one entry
//! per mouse-move. Freezes are counted per key, so nested freeze/unfreeze
//! pairs from independent interactions cannot prematurely unfreeze each
//! other; when the last key releases, the batched mutations commit as
//! exactly one entry.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::HashMap;

/// Snapshot-based undo/redo history over a cloneable state.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    stack: Vec<T>,
    cursor: usize,
    frozen: HashMap<String, usize>,
    pending: Option<T>,
}

impl<T: Clone> History<T> {
    /// Create a history whose first entry is the initial state.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            stack: vec![initial],
            cursor: 0,
            frozen: HashMap::new(),
            pending: None,
        }
    }

    /// Record a snapshot of the state after a structural mutation.
    ///
    /// While frozen, the snapshot is held back; only the most recent one
    /// commits when the last freeze key releases.
    pub fn record(&mut self, state: T) {
        if self.frozen.is_empty() {
            self.push(state);
        } else {
            self.pending = Some(state);
        }
    }

    fn push(&mut self, state: T) {
        if self.cursor + 1 < self.stack.len() {
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push(state);
        self.cursor = self.stack.len() - 1;
    }

    /// Begin batching under the given key. Reentrant per key.
    pub fn freeze(&mut self, key: &str) {
        *self.frozen.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Release one freeze under the given key. When the final freeze across
    /// all keys releases, any batched snapshot commits as one entry.
    pub fn unfreeze(&mut self, key: &str) {
        if let Some(count) = self.frozen.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.frozen.remove(key);
            }
        }
        if self.frozen.is_empty() {
            if let Some(state) = self.pending.take() {
                self.push(state);
            }
        }
    }

    /// Whether any freeze key is currently held.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.frozen.is_empty()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    /// Step back, returning the snapshot to restore.
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.stack[self.cursor].clone())
    }

    /// Step forward, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.stack[self.cursor].clone())
    }

    /// Number of recorded entries, including the initial state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        // The stack always holds at least the initial state.
        false
    }

    /// Drop all entries and restart from a new initial state.
    pub fn reset(&mut self, initial: T) {
        self.stack.clear();
        self.stack.push(initial);
        self.cursor = 0;
        self.frozen.clear();
        self.pending = None;
    }
}
