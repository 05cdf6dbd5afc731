//! The editing engine.
//!
//! `FocusEditor` owns the document, the caret tracker, the undo history and
//! the collaborators. Commands (see [`crate::execute`]) mutate block text and
//! then funnel through [`FocusEditor::commit`], which restyles the dirty
//! blocks, restores the caret and notifies the change listener when the
//! serialized text actually changed.

use std::ops::Range;

use web_time::Instant;

use crate::actions::{EditCommand, KeyCombo};
use crate::block::{Block, BlockId};
use crate::caret::CaretTracker;
use crate::classify::{ClassifyOptions, reclassify};
use crate::codec;
use crate::document::Document;
use crate::error::EditorError;
use crate::execute::CommandOutcome;
use crate::fence::{FenceRole, scan_fences};
use crate::link::{self, LinkAction, PointerGesture};
use crate::options::EditorOptions;
use crate::platform::{
    ChangeListener, ClipboardPlatform, CursorPlatform, CursorSync, PlatformSelection,
    RichTextConverter,
};
use crate::render::render_block;
use crate::text_helpers::char_len;
use crate::types::{CaretPosition, ChangeEvent, EditInfo, Selection};
use crate::undo::{History, Snapshot, UndoManager};

/// Attempts [`FocusEditor::restore_platform_caret`] makes before giving up.
pub const MAX_CARET_ATTEMPTS: u8 = 10;

/// Result of pushing the caret to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretSync {
    Restored,
    /// The platform was not ready; call again with `attempt` on the next tick.
    Retry { attempt: u8 },
    /// Attempts exhausted. Logged; the platform keeps whatever caret it has.
    GaveUp,
    /// There is no caret to restore.
    Skipped,
}

pub struct FocusEditor<L: ChangeListener = ()> {
    pub(crate) doc: Document,
    pub(crate) caret: CaretTracker,
    pub(crate) options: EditorOptions,
    listener: L,
    pub(crate) clipboard: Box<dyn ClipboardPlatform>,
    pub(crate) converter: Box<dyn RichTextConverter>,
    pub(crate) history: History,
    last_notified: String,
    last_edit: Option<EditInfo>,
    last_changed_at: Option<Instant>,
    pub(crate) max_length_reached: bool,
    last_rendered: Vec<BlockId>,
}

impl FocusEditor<()> {
    /// Initialize from markdown text.
    pub fn new(text: &str, options: EditorOptions) -> Self {
        Self::with_listener(text, options, ())
    }
}

impl<L: ChangeListener> FocusEditor<L> {
    pub fn with_listener(text: &str, options: EditorOptions, listener: L) -> Self {
        let history = History::new(options.history_limit);
        let mut editor = Self {
            doc: Document::new(),
            caret: CaretTracker::new(),
            options,
            listener,
            clipboard: Box::new(()),
            converter: Box::new(()),
            history,
            last_notified: String::new(),
            last_edit: None,
            last_changed_at: None,
            max_length_reached: false,
            last_rendered: Vec::new(),
        };
        editor.load(text, true);
        editor.place_initial_caret();
        editor
    }

    pub fn with_clipboard(mut self, clipboard: impl ClipboardPlatform + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_converter(mut self, converter: impl RichTextConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Replace the content. A fresh load rebuilds every block; otherwise
    /// unchanged blocks keep their identity and render.
    fn load(&mut self, text: &str, fresh: bool) {
        let decoded = codec::decode(text, self.options.max_text_length);
        if decoded.truncated {
            tracing::debug!(
                target: "focus::command",
                max = self.options.max_text_length,
                "input truncated to the length limit"
            );
        }
        let dirty: Vec<BlockId> = if fresh {
            self.doc = Document::from_lines(decoded.lines);
            self.doc.blocks().iter().map(Block::id).collect()
        } else {
            self.doc.replace_lines(decoded.lines)
        };
        self.doc.set_truncated(decoded.truncated);
        self.refresh(&dirty, !self.options.lazy_render);
        self.last_notified = self.doc.to_markdown();
    }

    fn place_initial_caret(&mut self) {
        let pos = if let Some(offset) = self.options.initial_caret_offset {
            self.caret.place_at_global(&self.doc, offset)
        } else if self.options.start_caret_at_end {
            let last = self.doc.last().id();
            self.caret.place_at_end(&self.doc, last)
        } else {
            let block = self
                .options
                .initial_active_block
                .and_then(|i| self.doc.id_at(i))
                .unwrap_or_else(|| self.doc.first().id());
            self.caret.place_at_start(&self.doc, block)
        };
        self.doc.set_active(Some(pos.block));
    }

    // === Commands ===

    /// Run a key combination through the keymap.
    pub fn handle_key(&mut self, combo: &KeyCombo, is_mac: bool) -> CommandOutcome {
        match EditCommand::from_key(combo, is_mac) {
            Some(cmd) => self.execute(cmd),
            None => CommandOutcome::ignored(),
        }
    }

    /// Execute a command and run its follow-up immediately.
    ///
    /// For headless use, where no platform edit has to land in between.
    pub fn execute_now(&mut self, cmd: EditCommand) -> CommandOutcome {
        let outcome = self.execute(cmd);
        if let Some(follow_up) = outcome.follow_up {
            self.run_follow_up(follow_up);
        }
        outcome
    }

    /// Insert text inline at the caret.
    pub fn insert_text(&mut self, text: &str) -> CommandOutcome {
        self.execute(EditCommand::InsertText(text.to_string()))
    }

    /// Import text at the active block: the block becomes its own text plus
    /// the imported text on the following lines, trimmed. Without an active
    /// block the text is appended to the document.
    pub fn apply_text(&mut self, text: &str) -> bool {
        if self.options.read_only {
            return false;
        }
        let text = text.replace('\r', "");
        let before = self.snapshot();
        let mut lines: Vec<String> = self.doc.lines().map(str::to_string).collect();

        let (index, merged) = match self.doc.active().and_then(|id| self.doc.index_of(id)) {
            Some(index) => {
                let joined = format!("{}\n{}", lines[index], text);
                lines.remove(index);
                (index, joined.trim().to_string())
            }
            None => {
                tracing::warn!(
                    target: "focus::command",
                    "no active block for imported text; appending at the end"
                );
                (lines.len(), text.trim().to_string())
            }
        };

        let capacity = self.remaining_capacity(&lines);
        let (merged, truncated) = match capacity {
            Some(0) => {
                self.max_length_reached = true;
                return false;
            }
            Some(capacity) => codec::truncate(&merged, capacity),
            None => (merged, false),
        };
        if truncated {
            self.doc.set_truncated(true);
        }

        let inserted = codec::split_lines(&merged);
        let count = inserted.len();
        lines.splice(index..index, inserted);
        let dirty = self.doc.replace_lines(lines);

        let last = self
            .doc
            .id_at(index + count - 1)
            .unwrap_or_else(|| self.doc.last().id());
        let len = self.doc.block(last).map_or(0, Block::len);
        self.commit(Some(before), &dirty, CaretPosition::new(last, len), true);
        true
    }

    fn remaining_capacity(&self, others: &[String]) -> Option<usize> {
        if !self.options.has_length_limit() {
            return None;
        }
        let used: usize = others.iter().map(|l| char_len(l) + 1).sum();
        Some(self.options.max_text_length.saturating_sub(used))
    }

    // === Serialization ===

    pub fn to_markdown(&self) -> String {
        self.doc.to_markdown()
    }

    /// Re-initialize from markdown. The caret goes back to its initial
    /// placement; history is cleared unless `clear_history` is false, in
    /// which case the replaced text becomes an undo step.
    pub fn from_markdown(&mut self, text: &str, clear_history: bool) {
        if clear_history {
            self.history.clear();
        } else {
            let before = self.snapshot();
            self.history.record(before);
        }
        self.load(text, false);
        self.place_initial_caret();
    }

    // === Accessors ===

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Global caret offset.
    pub fn caret_offset(&self) -> Option<usize> {
        self.caret.global_offset(&self.doc)
    }

    pub fn caret_position(&self) -> Option<CaretPosition> {
        self.caret.capture(&self.doc)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.caret.selection(&self.doc)
    }

    /// The document was cut short to fit the length limit.
    pub fn truncated(&self) -> bool {
        self.doc.truncated()
    }

    /// The last command was refused because of the length limit.
    pub fn max_length_reached(&self) -> bool {
        self.max_length_reached
    }

    pub fn last_edit(&self) -> Option<&EditInfo> {
        self.last_edit.as_ref()
    }

    /// When the change listener last fired.
    pub fn last_changed_at(&self) -> Option<Instant> {
        self.last_changed_at
    }

    /// Blocks rendered by the most recent refresh.
    pub fn last_rendered(&self) -> &[BlockId] {
        &self.last_rendered
    }

    // === Focus and caret ===

    pub fn focus(&mut self) {
        let pos = match self.caret.capture(&self.doc) {
            Some(pos) => pos,
            None => {
                let block = self.caret.resolve_block(&self.doc, None);
                self.caret.place_at_start(&self.doc, block)
            }
        };
        self.doc.set_active(Some(pos.block));
    }

    pub fn blur(&mut self) {
        self.doc.set_active(None);
    }

    /// Click over a block: activate the link under the pointer when the
    /// gesture allows it, otherwise place the caret.
    pub fn click(&mut self, pos: CaretPosition, gesture: PointerGesture) -> Option<LinkAction> {
        if let Some(action) = self.activate_link(pos.block, pos.offset, gesture) {
            return Some(action);
        }
        self.execute(EditCommand::PlaceCaret(pos));
        None
    }

    /// Resolve the link at `offset` in `block` for an activating gesture.
    pub fn activate_link(
        &mut self,
        block: BlockId,
        offset: usize,
        gesture: PointerGesture,
    ) -> Option<LinkAction> {
        if !gesture.activates_links() {
            return None;
        }
        let span = link::link_at(self.doc.block(block)?, offset)?;
        let action = link::resolve(&self.doc, block, &span)?;
        if let LinkAction::JumpToBlock(target) = action {
            let pos = self.caret.place_at_start(&self.doc, target);
            self.doc.set_active(Some(pos.block));
        }
        Some(action)
    }

    /// Pull the caret from the platform.
    ///
    /// Stale selections and an unready surface are logged and leave the
    /// editor with no active block. Anything else is returned.
    pub fn sync_caret(&mut self, cursor: &impl CursorSync) -> Result<(), EditorError> {
        match cursor.read_selection() {
            Ok(Some(PlatformSelection::Caret(pos))) => {
                if self.doc.contains(pos.block) {
                    let pos = self.caret.restore(&self.doc, pos, 0);
                    self.doc.set_active(Some(pos.block));
                } else {
                    tracing::warn!(
                        target: "focus::caret",
                        block = %pos.block,
                        "platform caret is in an unknown block"
                    );
                    self.doc.set_active(None);
                }
            }
            Ok(Some(PlatformSelection::Range { anchor, head })) => {
                let (Some(a), Some(h)) = (
                    self.doc.global_offset(&anchor),
                    self.doc.global_offset(&head),
                ) else {
                    tracing::warn!(target: "focus::caret", "platform selection is outside the document");
                    self.doc.set_active(None);
                    return Ok(());
                };
                self.caret.select(&self.doc, Selection::new(a, h));
                self.doc.set_active(Some(head.block));
            }
            Ok(None) => self.doc.set_active(None),
            Err(err) if err.is_transient() => {
                tracing::warn!(target: "focus::caret", error = %err, "caret query failed");
                self.doc.set_active(None);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Push the caret to the platform, mapped to the rendered offset.
    ///
    /// A transient failure asks the caller to retry with the returned
    /// attempt number until [`MAX_CARET_ATTEMPTS`] is reached.
    pub fn restore_platform_caret(
        &self,
        platform: &mut impl CursorPlatform,
        attempt: u8,
    ) -> Result<CaretSync, EditorError> {
        let Some(pos) = self.caret.capture(&self.doc) else {
            return Ok(CaretSync::Skipped);
        };
        let visible = self
            .doc
            .block(pos.block)
            .and_then(Block::render)
            .map_or(pos.offset, |render| render.to_visible(pos.offset));

        match platform.restore_caret(pos.block, visible) {
            Ok(()) => Ok(CaretSync::Restored),
            Err(err) if err.is_transient() => {
                let next = attempt.saturating_add(1);
                if next >= MAX_CARET_ATTEMPTS {
                    tracing::warn!(
                        target: "focus::caret",
                        attempts = next,
                        error = %err,
                        "giving up on caret restore"
                    );
                    Ok(CaretSync::GaveUp)
                } else {
                    tracing::debug!(target: "focus::caret", attempt = next, error = %err, "caret restore deferred");
                    Ok(CaretSync::Retry { attempt: next })
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    // === Rendering ===

    /// Render blocks in the index range whose cached render is stale.
    /// Returns how many were rendered.
    pub fn ensure_rendered(&mut self, range: Range<usize>) -> usize {
        let end = range.end.min(self.doc.block_count());
        let start = range.start.min(end);
        let mut rendered = 0;
        for block in &mut self.doc.blocks_mut()[start..end] {
            if block.needs_render() && render_into(block) {
                rendered += 1;
            }
        }
        rendered
    }

    /// Restyle after an edit.
    ///
    /// The fence scan always covers the whole document. A block is restyled
    /// when it is in `dirty` or its fence role no longer matches its tag;
    /// restyled blocks are re-rendered only if their text or tag changed.
    pub(crate) fn refresh(&mut self, dirty: &[BlockId], render: bool) {
        let roles = scan_fences(self.doc.lines(), self.options.max_empty_lines);
        let classify = ClassifyOptions {
            pre_indent: self.options.pre_indent,
        };
        let lazy = self.options.lazy_render;

        self.last_rendered.clear();
        for (block, role) in self.doc.blocks_mut().iter_mut().zip(roles) {
            let is_dirty = dirty.contains(&block.id());
            let fence_changed = match role {
                Some(role) => block.tag != role.tag(),
                None => block.tag.is_code(),
            };
            if !is_dirty && !fence_changed {
                continue;
            }
            match role {
                Some(role) => apply_fence_role(block, role),
                None => {
                    reclassify(block, classify);
                }
            }

            let wanted = render && (!lazy || is_dirty || block.render.is_some());
            if wanted && block.needs_render() && render_into(block) {
                self.last_rendered.push(block.id());
            }
        }

        if tracing::enabled!(target: "focus::render", tracing::Level::DEBUG) {
            tracing::debug!(
                target: "focus::render",
                dirty = dirty.len(),
                rendered = self.last_rendered.len(),
                "refreshed"
            );
        }
    }

    // === Commit ===

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.doc.raw_text(),
            caret: self.caret_offset().unwrap_or(0),
        }
    }

    /// Finish a mutation: restyle `dirty`, restore the caret, record the
    /// undo step and (unless deferred) notify.
    pub(crate) fn commit(
        &mut self,
        before: Option<Snapshot>,
        dirty: &[BlockId],
        caret: CaretPosition,
        notify: bool,
    ) {
        self.refresh(dirty, true);
        let pos = self.caret.restore(&self.doc, caret, 0);
        self.doc.set_active(Some(pos.block));

        if let Some(before) = before {
            let after_len = self.doc.text_len();
            let raw = self.doc.raw_text();
            if raw != before.text {
                let before_len = char_len(&before.text);
                let before_blocks = before.text.matches('\n').count() + 1;
                self.last_edit = Some(EditInfo {
                    block: Some(pos.block),
                    edit_char_pos: before.caret,
                    inserted_len: after_len.saturating_sub(before_len),
                    deleted_len: before_len.saturating_sub(after_len),
                    changed_structure: before_blocks != self.doc.block_count(),
                    doc_len_after: after_len,
                    timestamp: Instant::now(),
                });
                self.history.record(before);
            }
        }

        if notify {
            self.notify();
        }
    }

    /// Fire the change listener if the serialization moved since the last
    /// notification. Returns whether it fired.
    pub(crate) fn notify(&mut self) -> bool {
        let text = self.doc.to_markdown();
        if text == self.last_notified {
            return false;
        }
        let event = ChangeEvent {
            caret_offset: self.caret_offset().unwrap_or(0),
            text,
        };
        self.listener.on_change(&event);
        self.last_notified = event.text;
        self.last_changed_at = Some(Instant::now());
        true
    }

    fn restore_snapshot(&mut self, snapshot: Snapshot) {
        let dirty = self.doc.replace_lines(codec::split_lines(&snapshot.text));
        let caret = self.doc.position_at(snapshot.caret);
        self.commit(None, &dirty, caret, true);
    }
}

fn apply_fence_role(block: &mut Block, role: FenceRole) {
    block.tag = role.tag();
    block.whitespace_only = false;
}

/// Render a block in place. On failure the previous render is kept.
fn render_into(block: &mut Block) -> bool {
    match render_block(block) {
        Ok(render) => {
            block.render = Some(render);
            true
        }
        Err(err) => {
            tracing::warn!(
                target: "focus::render",
                block = %block.id(),
                error = %err,
                "render failed; keeping previous render"
            );
            false
        }
    }
}

impl<L: ChangeListener> UndoManager for FocusEditor<L> {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.take_undo(current) {
            Some(target) => {
                self.restore_snapshot(target);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.take_redo(current) {
            Some(target) => {
                self.restore_snapshot(target);
                true
            }
            None => false,
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}
