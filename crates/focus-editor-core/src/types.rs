//! Core editor types: caret, selection and edit tracking.

use std::ops::Range;

use web_time::Instant;

use crate::block::BlockId;

/// Caret as a block handle plus a char offset inside that block's text.
///
/// The linear form (a global char offset over the newline-joined document)
/// is obtained through [`crate::Document::global_offset`] and
/// [`crate::Document::position_at`].
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    pub block: BlockId,
    /// Char offset within the block (NOT byte offset!)
    pub offset: usize,
}

impl CaretPosition {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Text selection with anchor and head positions, as global char offsets.
///
/// The anchor is where the selection started, the head is where the caret is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where caret is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (caret position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }
}

/// Information about the most recent text change.
#[derive(Clone, Debug)]
pub struct EditInfo {
    /// Block the caret was in when the edit was made
    pub block: Option<BlockId>,
    /// Global char offset where the edit occurred
    pub edit_char_pos: usize,
    /// Number of characters inserted
    pub inserted_len: usize,
    /// Number of characters deleted
    pub deleted_len: usize,
    /// Whether blocks were added or removed
    pub changed_structure: bool,
    /// Document length (in chars) after this edit was applied.
    pub doc_len_after: usize,
    /// When this edit occurred.
    pub timestamp: Instant,
}

impl PartialEq for EditInfo {
    fn eq(&self, other: &Self) -> bool {
        // Compare all fields except timestamp (not meaningful for equality)
        self.block == other.block
            && self.edit_char_pos == other.edit_char_pos
            && self.inserted_len == other.inserted_len
            && self.deleted_len == other.deleted_len
            && self.changed_structure == other.changed_structure
            && self.doc_len_after == other.doc_len_after
    }
}

impl EditInfo {
    /// Whether this edit info predates the current document state.
    pub fn is_stale(&self, current_doc_len: usize) -> bool {
        self.doc_len_after != current_doc_len
    }
}

/// Payload of the `onChange` notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Serialized document
    pub text: String,
    /// Global caret offset
    pub caret_offset: usize,
}
