//! Undo/redo history.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History` - bounded snapshot stacks of serialized text and caret

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Document state at one undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    /// Global caret offset
    pub caret: usize,
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::options::DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state before an edit.
    pub fn record(&mut self, before: Snapshot) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        if self.undo_stack.last().is_some_and(|s| s.text == before.text) {
            return;
        }
        self.undo_stack.push(before);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the state to return to, parking `current` for redo.
    pub fn take_undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let target = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(target)
    }

    /// Pop the state to re-apply, parking `current` for undo.
    pub fn take_redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let target = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(target)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
