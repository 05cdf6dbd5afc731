//! Caret tracking.
//!
//! The tracker stores the caret (and an optional selection anchor) as
//! block-relative positions, so edits to other blocks never move it. It
//! converts to linear offsets on demand and clamps whenever a block's text
//! got shorter than the remembered offset.

use crate::block::BlockId;
use crate::document::Document;
use crate::types::{CaretPosition, Selection};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaretTracker {
    caret: Option<CaretPosition>,
    /// Selection anchor; `None` while the selection is collapsed.
    anchor: Option<CaretPosition>,
}

fn clamp(doc: &Document, pos: CaretPosition) -> Option<CaretPosition> {
    let block = doc.block(pos.block)?;
    Some(CaretPosition::new(pos.block, pos.offset.min(block.len())))
}

impl CaretTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current caret, validated against the document.
    ///
    /// A caret whose block no longer exists is a stale reference: it is
    /// logged and reported as no caret.
    pub fn capture(&self, doc: &Document) -> Option<CaretPosition> {
        let pos = self.caret?;
        match clamp(doc, pos) {
            Some(pos) => Some(pos),
            None => {
                tracing::warn!(
                    target: "focus::caret",
                    block = %pos.block,
                    "caret refers to a removed block; treating as no active block"
                );
                None
            }
        }
    }

    /// Put the caret back at `pos` shifted by `delta`, clamped to the block.
    ///
    /// If `pos.block` is gone the fallback block from [`Self::resolve_block`]
    /// is used with the same offset. Collapses any selection.
    pub fn restore(&mut self, doc: &Document, pos: CaretPosition, delta: isize) -> CaretPosition {
        let block = if doc.contains(pos.block) {
            pos.block
        } else {
            self.resolve_block(doc, None)
        };
        let offset = pos.offset.saturating_add_signed(delta);
        let restored = clamp(doc, CaretPosition::new(block, offset))
            .unwrap_or_else(|| CaretPosition::new(doc.first().id(), 0));
        self.caret = Some(restored);
        self.anchor = None;
        restored
    }

    pub fn place_at_start(&mut self, doc: &Document, block: BlockId) -> CaretPosition {
        self.restore(doc, CaretPosition::new(block, 0), 0)
    }

    pub fn place_at_end(&mut self, doc: &Document, block: BlockId) -> CaretPosition {
        let len = doc.block(block).map_or(0, |b| b.len());
        self.restore(doc, CaretPosition::new(block, len), 0)
    }

    /// Place at a linear offset.
    pub fn place_at_global(&mut self, doc: &Document, offset: usize) -> CaretPosition {
        let pos = doc.position_at(offset);
        self.restore(doc, pos, 0)
    }

    /// Block to work in when the caret is ambiguous: the explicitly given
    /// block, then the block marked active, then the first block.
    pub fn resolve_block(&self, doc: &Document, explicit: Option<BlockId>) -> BlockId {
        explicit
            .filter(|id| doc.contains(*id))
            .or_else(|| doc.active().filter(|id| doc.contains(*id)))
            .unwrap_or_else(|| doc.first().id())
    }

    /// Linear offset of the caret.
    pub fn global_offset(&self, doc: &Document) -> Option<usize> {
        self.capture(doc).and_then(|pos| doc.global_offset(&pos))
    }

    /// Move the head while keeping (or starting) a selection anchor.
    pub fn extend_to(&mut self, doc: &Document, head: CaretPosition) {
        let Some(head) = clamp(doc, head) else {
            return;
        };
        if self.anchor.is_none() {
            self.anchor = self.capture(doc);
        }
        self.caret = Some(head);
    }

    /// Set an explicit selection from linear offsets.
    pub fn select(&mut self, doc: &Document, selection: Selection) {
        let anchor = doc.position_at(selection.anchor);
        let head = doc.position_at(selection.head);
        self.caret = Some(head);
        self.anchor = (!selection.is_collapsed()).then_some(anchor);
    }

    /// Current selection as linear offsets; `None` when collapsed or stale.
    pub fn selection(&self, doc: &Document) -> Option<Selection> {
        let anchor = clamp(doc, self.anchor?)?;
        let head = self.capture(doc)?;
        let sel = Selection::new(doc.global_offset(&anchor)?, doc.global_offset(&head)?);
        (!sel.is_collapsed()).then_some(sel)
    }

    pub fn has_selection(&self, doc: &Document) -> bool {
        self.selection(doc).is_some()
    }
}
