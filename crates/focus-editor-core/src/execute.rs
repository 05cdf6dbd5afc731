//! Command execution.
//!
//! One method per transition of the command processor. Each applies its
//! edit to the block texts, then calls [`FocusEditor::commit`]. Edits that
//! need to look at the result again after the platform has settled return a
//! [`FollowUp`], which carries block ids only and re-fetches everything when
//! it runs.

use std::ops::Range;

use crate::actions::{EditCommand, Motion, PastePayload};
use crate::block::{Block, BlockId};
use crate::codec;
use crate::editor::FocusEditor;
use crate::platform::ChangeListener;
use crate::text_helpers::{
    char_len, detect_list_context, find_word_boundary_backward, find_word_boundary_forward,
    insert_at_char, is_list_item_empty, leading_indent, remove_chars, slice_chars, split_at_char,
};
use crate::types::{CaretPosition, Selection};
use crate::undo::UndoManager;

/// What a command did, for the binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The engine applied the operation; the platform's default handling
    /// must not run.
    pub suppress_default: bool,
    /// Work to run once the platform has applied its own changes.
    pub follow_up: Option<FollowUp>,
}

impl CommandOutcome {
    pub fn handled() -> Self {
        Self {
            suppress_default: true,
            follow_up: None,
        }
    }

    /// Left to the platform.
    pub fn ignored() -> Self {
        Self::default()
    }

    fn then(self, follow_up: FollowUp) -> Self {
        Self {
            follow_up: Some(follow_up),
            ..self
        }
    }
}

/// Deferred second phase of a command.
///
/// A follow-up whose blocks are gone by the time it runs does nothing
/// beyond flushing the pending change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Seed `target` with the list marker of `source`.
    ContinueList { source: BlockId, target: BlockId },
    /// Trim trailing whitespace around the caret block after a deletion.
    SettleBackspace { block: BlockId },
}

/// Blocks on each side of the caret block tidied up after Backspace.
const SETTLE_RADIUS: usize = 2;

impl<L: ChangeListener> FocusEditor<L> {
    /// Execute a command.
    pub fn execute(&mut self, cmd: EditCommand) -> CommandOutcome {
        self.max_length_reached = false;
        if self.options.read_only && cmd.is_mutating() {
            tracing::debug!(target: "focus::command", ?cmd, "read-only; ignoring");
            return CommandOutcome::ignored();
        }
        tracing::debug!(target: "focus::command", ?cmd, "execute");

        match cmd {
            EditCommand::InsertText(text) => self.execute_insert(&text),
            EditCommand::InsertNewline => self.execute_newline(),
            EditCommand::Indent => self.execute_indent(),
            EditCommand::Outdent => self.execute_outdent(),
            EditCommand::DeleteBackward => self.execute_delete_backward(),
            EditCommand::DeleteForward => self.execute_delete_forward(),
            EditCommand::Navigate { motion, extend } => self.execute_navigate(motion, extend),
            EditCommand::PlaceCaret(pos) => {
                let pos = self.caret.restore(&self.doc, pos, 0);
                self.doc.set_active(Some(pos.block));
                CommandOutcome::ignored()
            }
            EditCommand::Paste(payload) => self.execute_paste(payload),
            EditCommand::SelectAll => {
                let len = self.doc.text_len();
                self.caret.select(&self.doc, Selection::new(0, len));
                let last = self.doc.last().id();
                self.doc.set_active(Some(last));
                CommandOutcome::handled()
            }
            EditCommand::Cut => self.execute_cut(),
            EditCommand::Undo => {
                self.undo();
                CommandOutcome::handled()
            }
            EditCommand::Redo => {
                self.redo();
                CommandOutcome::handled()
            }
        }
    }

    /// Run the second phase of a command.
    ///
    /// Returns whether it changed anything. Safe to call after later
    /// commands have run.
    pub fn run_follow_up(&mut self, follow_up: FollowUp) -> bool {
        let changed = match follow_up {
            FollowUp::ContinueList { source, target } => self.continue_list(source, target),
            FollowUp::SettleBackspace { block } => self.settle_backspace(block),
        };
        if !changed {
            // Flush the notification the first phase deferred.
            self.notify();
        }
        changed
    }

    /// Caret, falling back to the start of the resolved block.
    fn current_caret(&self) -> CaretPosition {
        self.caret.capture(&self.doc).unwrap_or_else(|| {
            CaretPosition::new(self.caret.resolve_block(&self.doc, None), 0)
        })
    }

    fn current_offset(&self) -> usize {
        let pos = self.current_caret();
        self.doc.global_offset(&pos).unwrap_or(0)
    }

    fn exceeds_limit(&self, removed: usize, added: usize) -> bool {
        self.options.has_length_limit()
            && self.doc.text_len().saturating_sub(removed) + added > self.options.max_text_length
    }

    fn refuse_for_length(&mut self) -> CommandOutcome {
        tracing::debug!(
            target: "focus::command",
            max = self.options.max_text_length,
            "edit refused at length limit"
        );
        self.max_length_reached = true;
        CommandOutcome::handled()
    }

    /// Replace a linear char range with `insert` (newline-free of `\r`).
    /// Returns the dirty blocks and the linear offset after the insertion.
    fn splice(&mut self, range: Range<usize>, insert: &str) -> (Vec<BlockId>, usize) {
        let mut raw = self.doc.raw_text();
        remove_chars(&mut raw, range.clone());
        insert_at_char(&mut raw, range.start, insert);
        let dirty = self.doc.replace_lines(codec::split_lines(&raw));
        (dirty, range.start + char_len(insert))
    }

    fn commit_splice(&mut self, range: Range<usize>, insert: &str) {
        let before = self.snapshot();
        let (dirty, offset) = self.splice(range, insert);
        let caret = self.doc.position_at(offset);
        self.commit(Some(before), &dirty, caret, true);
    }

    fn execute_insert(&mut self, text: &str) -> CommandOutcome {
        let text = text.replace('\r', "");
        if text.is_empty() {
            return CommandOutcome::handled();
        }
        let selection = self.caret.selection(&self.doc);
        let removed = selection.map_or(0, |s| s.len());
        if self.exceeds_limit(removed, char_len(&text)) {
            return self.refuse_for_length();
        }

        let pos = self.current_caret();
        if selection.is_some() || text.contains('\n') {
            let offset = self.current_offset();
            let range = selection.map_or(offset..offset, |s| s.to_range());
            self.commit_splice(range, &text);
            return CommandOutcome::handled();
        }

        // Typing inside one block.
        let before = self.snapshot();
        let Some(block) = self.doc.block_mut(pos.block) else {
            return CommandOutcome::ignored();
        };
        insert_at_char(block.text_mut(), pos.offset, &text);
        let caret = CaretPosition::new(pos.block, pos.offset + char_len(&text));
        self.commit(Some(before), &[pos.block], caret, true);
        CommandOutcome::handled()
    }

    fn execute_newline(&mut self) -> CommandOutcome {
        let before = self.snapshot();
        if let Some(sel) = self.caret.selection(&self.doc) {
            if self.exceeds_limit(sel.len(), 1) {
                return self.refuse_for_length();
            }
            // Same undo step as the split below.
            let (dirty, offset) = self.splice(sel.to_range(), "");
            let caret = self.doc.position_at(offset);
            self.commit(None, &dirty, caret, false);
        }
        if self.exceeds_limit(0, 1) {
            return self.refuse_for_length();
        }

        let pos = self.current_caret();
        let Some(index) = self.doc.index_of(pos.block) else {
            return CommandOutcome::ignored();
        };
        let text = self.doc.block(pos.block).map(|b| b.text().to_string()).unwrap_or_default();
        let len = char_len(&text);
        let guess = self.options.guess_next_line_prefix_on_enter;

        // Blank line above; the caret stays with the text.
        if pos.offset == 0 && len > 0 {
            let new = self.doc.insert(index, "");
            self.commit(Some(before), &[new], pos, true);
            return CommandOutcome::handled();
        }

        // An empty list marker ends the list.
        if guess && pos.offset == len && is_list_item_empty(&text) {
            if let Some(block) = self.doc.block_mut(pos.block) {
                block.set_text("");
            }
            self.commit(Some(before), &[pos.block], CaretPosition::new(pos.block, 0), true);
            return CommandOutcome::handled();
        }

        let (head, tail) = split_at_char(&text, pos.offset);
        let indent = leading_indent(&text);
        let (tail, caret_offset) = if pos.offset < len && pos.offset > char_len(indent) {
            (format!("{indent}{tail}"), char_len(indent))
        } else {
            (tail.to_string(), 0)
        };
        let head = head.trim_end().to_string();

        if let Some(block) = self.doc.block_mut(pos.block) {
            block.set_text(head);
        }
        let new = self.doc.insert(index + 1, tail);

        let follow_up = (guess && pos.offset == len && detect_list_context(&text).is_some())
            .then_some(FollowUp::ContinueList {
                source: pos.block,
                target: new,
            });
        self.commit(
            Some(before),
            &[pos.block, new],
            CaretPosition::new(new, caret_offset),
            follow_up.is_none(),
        );

        match follow_up {
            Some(follow_up) => CommandOutcome::handled().then(follow_up),
            None => CommandOutcome::handled(),
        }
    }

    fn continue_list(&mut self, source: BlockId, target: BlockId) -> bool {
        let (Some(src), Some(tgt)) = (self.doc.block(source), self.doc.block(target)) else {
            tracing::debug!(target: "focus::command", "list continuation target is gone");
            return false;
        };
        let Some(ctx) = detect_list_context(src.text()) else {
            return false;
        };
        let prefix = ctx.continuation();
        if prefix.is_empty() || tgt.text().starts_with(&prefix) {
            return false;
        }
        if self.exceeds_limit(0, char_len(&prefix)) {
            self.max_length_reached = true;
            return false;
        }

        let caret = self.current_caret();
        if let Some(block) = self.doc.block_mut(target) {
            insert_at_char(block.text_mut(), 0, &prefix);
        }
        let caret = if caret.block == target {
            CaretPosition::new(target, caret.offset + char_len(&prefix))
        } else {
            caret
        };
        // Part of the Enter's undo step.
        self.commit(None, &[target], caret, true);
        true
    }

    fn execute_indent(&mut self) -> CommandOutcome {
        if let Some(sel) = self.caret.selection(&self.doc) {
            return self.indent_blocks(sel, true);
        }
        let offset = self.current_offset();
        if self.options.release_tab_at_edges && offset == self.doc.text_len() {
            return CommandOutcome::ignored();
        }
        let unit = self.options.indent_unit.clone();
        if self.exceeds_limit(0, char_len(&unit)) {
            return self.refuse_for_length();
        }

        let pos = self.current_caret();
        let before = self.snapshot();
        if let Some(block) = self.doc.block_mut(pos.block) {
            insert_at_char(block.text_mut(), pos.offset, &unit);
        }
        let caret = CaretPosition::new(pos.block, pos.offset + char_len(&unit));
        self.commit(Some(before), &[pos.block], caret, true);
        CommandOutcome::handled()
    }

    fn execute_outdent(&mut self) -> CommandOutcome {
        if let Some(sel) = self.caret.selection(&self.doc) {
            return self.indent_blocks(sel, false);
        }
        if self.options.release_tab_at_edges && self.current_offset() == 0 {
            return CommandOutcome::ignored();
        }

        let pos = self.current_caret();
        let before = self.snapshot();
        let unit = self.options.indent_unit.clone();
        let removed = self.doc.block_mut(pos.block).map_or(0, |b| outdent(b, &unit));
        if removed > 0 {
            let caret = CaretPosition::new(pos.block, pos.offset.saturating_sub(removed));
            self.commit(Some(before), &[pos.block], caret, true);
        }
        CommandOutcome::handled()
    }

    /// Indent or outdent every non-empty block the selection touches, then
    /// select the same text again.
    fn indent_blocks(&mut self, sel: Selection, indent: bool) -> CommandOutcome {
        let anchor = self.doc.position_at(sel.anchor);
        let head = self.doc.position_at(sel.head);
        let (Some(a), Some(h)) = (self.doc.index_of(anchor.block), self.doc.index_of(head.block))
        else {
            return CommandOutcome::ignored();
        };
        let range = a.min(h)..a.max(h) + 1;
        let unit = self.options.indent_unit.clone();
        let unit_len = char_len(&unit);

        let targets: Vec<BlockId> = self.doc.blocks()[range]
            .iter()
            .filter(|b| !b.is_empty())
            .map(Block::id)
            .collect();
        if indent && self.exceeds_limit(0, unit_len * targets.len()) {
            return self.refuse_for_length();
        }

        let before = self.snapshot();
        let mut dirty = Vec::with_capacity(targets.len());
        let shift = |pos: CaretPosition, block: BlockId, amount: usize| {
            if pos.block != block {
                pos
            } else if indent {
                CaretPosition::new(block, pos.offset + amount)
            } else {
                CaretPosition::new(block, pos.offset.saturating_sub(amount))
            }
        };
        let (mut anchor, mut head) = (anchor, head);
        for id in targets {
            let Some(block) = self.doc.block_mut(id) else {
                continue;
            };
            let amount = if indent {
                insert_at_char(block.text_mut(), 0, &unit);
                unit_len
            } else {
                outdent(block, &unit)
            };
            if amount > 0 {
                anchor = shift(anchor, id, amount);
                head = shift(head, id, amount);
                dirty.push(id);
            }
        }
        if dirty.is_empty() {
            return CommandOutcome::handled();
        }

        self.commit(Some(before), &dirty, head, false);
        if let (Some(a), Some(h)) = (self.doc.global_offset(&anchor), self.doc.global_offset(&head)) {
            self.caret.select(&self.doc, Selection::new(a, h));
        }
        self.notify();
        CommandOutcome::handled()
    }

    fn execute_delete_backward(&mut self) -> CommandOutcome {
        if self.doc.block_count() == 1 && self.doc.first().is_empty() {
            return CommandOutcome::handled();
        }

        if let Some(sel) = self.caret.selection(&self.doc) {
            let before = self.snapshot();
            let (dirty, offset) = self.splice(sel.to_range(), "");
            let caret = self.doc.position_at(offset);
            self.commit(Some(before), &dirty, caret, false);
            return self.settle_outcome();
        }

        let pos = self.current_caret();
        if pos.offset > 0 {
            let before = self.snapshot();
            if let Some(block) = self.doc.block_mut(pos.block) {
                remove_chars(block.text_mut(), pos.offset - 1..pos.offset);
            }
            let caret = CaretPosition::new(pos.block, pos.offset - 1);
            self.commit(Some(before), &[pos.block], caret, false);
            return self.settle_outcome();
        }

        // Join with the previous block.
        let offset = self.current_offset();
        if offset == 0 {
            return CommandOutcome::handled();
        }
        let before = self.snapshot();
        let (dirty, offset) = self.splice(offset - 1..offset, "");
        let caret = self.doc.position_at(offset);
        self.commit(Some(before), &dirty, caret, false);
        self.settle_outcome()
    }

    fn settle_outcome(&self) -> CommandOutcome {
        let block = self.current_caret().block;
        CommandOutcome::handled().then(FollowUp::SettleBackspace { block })
    }

    fn settle_backspace(&mut self, block: BlockId) -> bool {
        if !self.doc.contains(block) {
            tracing::debug!(target: "focus::command", %block, "settle target is gone");
            return false;
        }
        let caret = self.current_caret();
        let Some(index) = self.doc.index_of(caret.block) else {
            return false;
        };
        let last = self.doc.block_count() - 1;
        let lo = index.saturating_sub(SETTLE_RADIUS);
        let hi = (index + SETTLE_RADIUS).min(last);

        let mut dirty = Vec::new();
        for i in (lo..=hi).filter(|i| *i != index) {
            let Some(block) = self.doc.get_mut(i) else {
                continue;
            };
            let trimmed = block.text().trim_end();
            if trimmed.len() != block.text().len() {
                let trimmed = trimmed.to_string();
                block.set_text(trimmed);
                dirty.push(block.id());
            }
        }
        if dirty.is_empty() {
            return false;
        }
        self.commit(None, &dirty, caret, true);
        true
    }

    fn execute_delete_forward(&mut self) -> CommandOutcome {
        if let Some(sel) = self.caret.selection(&self.doc) {
            self.commit_splice(sel.to_range(), "");
            return CommandOutcome::handled();
        }
        let offset = self.current_offset();
        if offset < self.doc.text_len() {
            self.commit_splice(offset..offset + 1, "");
        }
        CommandOutcome::handled()
    }

    fn execute_navigate(&mut self, motion: Motion, extend: bool) -> CommandOutcome {
        let pos = self.current_caret();
        let offset = self.current_offset();
        let index = self.doc.index_of(pos.block).unwrap_or(0);
        let block_len = self.doc.block(pos.block).map_or(0, Block::len);
        let selection = self.caret.selection(&self.doc);

        let target = match motion {
            Motion::Left => match selection {
                Some(sel) if !extend => self.doc.position_at(sel.start()),
                _ => self.doc.position_at(offset.saturating_sub(1)),
            },
            Motion::Right => match selection {
                Some(sel) if !extend => self.doc.position_at(sel.end()),
                _ => self.doc.position_at(offset + 1),
            },
            Motion::WordLeft if pos.offset == 0 => self.doc.position_at(offset.saturating_sub(1)),
            Motion::WordLeft => {
                let text = self.doc.block(pos.block).map_or("", Block::text);
                CaretPosition::new(pos.block, find_word_boundary_backward(text, pos.offset))
            }
            Motion::WordRight if pos.offset >= block_len => self.doc.position_at(offset + 1),
            Motion::WordRight => {
                let text = self.doc.block(pos.block).map_or("", Block::text);
                CaretPosition::new(pos.block, find_word_boundary_forward(text, pos.offset))
            }
            Motion::Up => match index.checked_sub(1).and_then(|i| self.doc.id_at(i)) {
                Some(prev) => CaretPosition::new(prev, pos.offset),
                None => CaretPosition::new(pos.block, 0),
            },
            Motion::Down => match self.doc.id_at(index + 1) {
                Some(next) => CaretPosition::new(next, pos.offset),
                None => CaretPosition::new(pos.block, block_len),
            },
            Motion::BlockStart => CaretPosition::new(pos.block, 0),
            Motion::BlockEnd => CaretPosition::new(pos.block, block_len),
            Motion::DocumentStart => self.doc.position_at(0),
            Motion::DocumentEnd => self.doc.position_at(self.doc.text_len()),
            Motion::Stay => {
                self.doc.set_active(Some(pos.block));
                return CommandOutcome::ignored();
            }
        };

        if extend {
            self.caret.extend_to(&self.doc, target);
        } else {
            self.caret.restore(&self.doc, target, 0);
        }
        self.doc.set_active(Some(target.block));
        CommandOutcome::ignored()
    }

    fn paste_text(&self, payload: &PastePayload) -> String {
        let plain = self.options.force_plain_text_on_paste || payload.plain_requested;
        let text = match &payload.html {
            Some(html) if !plain => match self.converter.to_markdown(html) {
                Ok(markdown) => markdown,
                Err(err) => {
                    tracing::warn!(
                        target: "focus::paste",
                        error = %err,
                        "rich paste conversion failed; pasting plain text"
                    );
                    payload.plain.clone()
                }
            },
            _ => payload.plain.clone(),
        };
        text.replace('\r', "")
    }

    fn execute_paste(&mut self, payload: PastePayload) -> CommandOutcome {
        let text = self.paste_text(&payload);
        if text.is_empty() {
            return CommandOutcome::handled();
        }
        let total = self.doc.text_len();
        let selection = self.caret.selection(&self.doc);
        let replace_all = self.doc.is_blank()
            || selection.is_some_and(|s| s.start() == 0 && s.end() == total);

        let before = self.snapshot();
        if replace_all {
            let (text, truncated) = codec::truncate(text.trim(), self.options.max_text_length);
            tracing::debug!(target: "focus::paste", truncated, "paste replaces document");
            let dirty = self.doc.replace_lines(codec::split_lines(&text));
            self.doc.set_truncated(truncated);
            let caret = self.doc.position_at(self.doc.text_len());
            self.commit(Some(before), &dirty, caret, true);
            return CommandOutcome::handled();
        }

        let offset = self.current_offset();
        let range = selection.map_or(offset..offset, |s| s.to_range());
        let text = if self.options.has_length_limit() {
            let used = total - range.len();
            let capacity = self.options.max_text_length.saturating_sub(used);
            if capacity == 0 {
                return self.refuse_for_length();
            }
            let (text, truncated) = codec::truncate(&text, capacity);
            if truncated {
                tracing::debug!(target: "focus::paste", capacity, "paste truncated");
                self.doc.set_truncated(true);
            }
            text
        } else {
            text
        };

        let (dirty, offset) = self.splice(range, &text);
        let caret = self.doc.position_at(offset);
        self.commit(Some(before), &dirty, caret, true);
        CommandOutcome::handled()
    }

    fn execute_cut(&mut self) -> CommandOutcome {
        if let Some(sel) = self.caret.selection(&self.doc) {
            let raw = self.doc.raw_text();
            let text = slice_chars(&raw, sel.to_range());
            if let Err(err) = self.clipboard.write_text(text) {
                tracing::warn!(target: "focus::command", error = %err, "clipboard write failed; not cutting");
                return CommandOutcome::ignored();
            }
            self.commit_splice(sel.to_range(), "");
            return CommandOutcome::handled();
        }

        let pos = self.current_caret();
        let Some(index) = self.doc.index_of(pos.block) else {
            return CommandOutcome::ignored();
        };
        let text = self.doc.block(pos.block).map(|b| b.text().to_string()).unwrap_or_default();
        if let Err(err) = self.clipboard.write_text(&text) {
            tracing::warn!(target: "focus::command", error = %err, "clipboard write failed; not cutting");
            return CommandOutcome::ignored();
        }

        let before = self.snapshot();
        let next = self.doc.id_at(index + 1);
        let prev = index.checked_sub(1).and_then(|i| self.doc.id_at(i));
        self.doc.remove(pos.block);

        let caret = match (next, prev) {
            (Some(next), _) => CaretPosition::new(next, 0),
            (None, Some(prev)) => {
                let len = self.doc.block(prev).map_or(0, Block::len);
                CaretPosition::new(prev, len)
            }
            (None, None) => CaretPosition::new(self.doc.first().id(), 0),
        };
        self.commit(Some(before), &[caret.block], caret, true);
        CommandOutcome::handled()
    }
}

/// Remove one indent unit (or as much leading whitespace as there is, up to
/// its length) from the start of a block. Returns the chars removed.
fn outdent(block: &mut Block, unit: &str) -> usize {
    let text = block.text();
    let count = if !unit.is_empty() && text.starts_with(unit) {
        char_len(unit)
    } else if text.starts_with('\t') {
        1
    } else {
        char_len(leading_indent(text)).min(char_len(unit).max(1))
    };
    if count > 0 {
        remove_chars(block.text_mut(), 0..count);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Key, KeyCombo};
    use crate::options::EditorOptions;
    use crate::undo::UndoManager;

    fn make_editor(content: &str) -> FocusEditor {
        FocusEditor::new(content, EditorOptions::default())
    }

    fn lines(editor: &FocusEditor) -> Vec<String> {
        editor.document().lines().map(str::to_string).collect()
    }

    fn caret_at(editor: &mut FocusEditor, offset: usize) {
        let pos = editor.document().position_at(offset);
        let _ = editor.execute(EditCommand::PlaceCaret(pos));
    }

    #[test]
    fn test_insert() {
        let mut editor = make_editor("hello");
        caret_at(&mut editor, 5);
        let outcome = editor.insert_text(" world");
        assert!(outcome.suppress_default);
        assert_eq!(editor.to_markdown(), "hello world");
        assert_eq!(editor.caret_offset(), Some(11));
    }

    #[test]
    fn test_insert_multiline_splits_blocks() {
        let mut editor = make_editor("ad");
        caret_at(&mut editor, 1);
        let _ = editor.insert_text("b\nc");
        assert_eq!(lines(&editor), vec!["ab", "cd"]);
        assert_eq!(editor.caret_offset(), Some(4));
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut editor = make_editor("one two");
        editor.caret.select(&editor.doc, Selection::new(4, 7));
        let _ = editor.insert_text("2");
        assert_eq!(editor.to_markdown(), "one 2");
    }

    #[test]
    fn test_enter_splits_block() {
        let mut editor = make_editor("abcd");
        let first = editor.document().first().id();
        caret_at(&mut editor, 2);
        let outcome = editor.execute(EditCommand::InsertNewline);
        assert_eq!(outcome.follow_up, None);
        assert_eq!(lines(&editor), vec!["ab", "cd"]);
        assert_eq!(editor.document().first().id(), first);
        assert_eq!(editor.caret_offset(), Some(3));
        assert!(editor.document().is_active(editor.document().id_at(1).unwrap()));
    }

    #[test]
    fn test_enter_at_start_inserts_above() {
        let mut editor = make_editor("text");
        let id = editor.document().first().id();
        let _ = editor.execute(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["", "text"]);
        assert_eq!(editor.caret_position(), Some(CaretPosition::new(id, 0)));
        assert_eq!(editor.caret_offset(), Some(1));
    }

    #[test]
    fn test_enter_carries_indent_mid_line() {
        let mut editor = make_editor("    some code");
        caret_at(&mut editor, 9);
        let _ = editor.execute_now(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["    some", "    code"]);
        assert_eq!(editor.caret_offset(), Some(9 + 4));
    }

    #[test]
    fn test_enter_keeps_whitespace_after_caret() {
        let mut editor = make_editor("one two");
        caret_at(&mut editor, 3);
        let _ = editor.execute_now(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["one", " two"]);
        assert_eq!(editor.caret_offset(), Some(4));

        let mut editor = make_editor("  a  b");
        caret_at(&mut editor, 3);
        let _ = editor.execute_now(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["  a", "    b"]);
        assert_eq!(editor.caret_offset(), Some(4 + 2));
    }

    #[test]
    fn test_enter_trims_before_part() {
        let mut editor = make_editor("one two");
        caret_at(&mut editor, 4);
        let _ = editor.execute(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["one", "two"]);
    }

    #[test]
    fn test_ordered_list_increments() {
        let mut editor = make_editor("1. first");
        caret_at(&mut editor, 8);
        let outcome = editor.execute(EditCommand::InsertNewline);
        let follow_up = outcome.follow_up.unwrap();
        assert_eq!(lines(&editor), vec!["1. first", ""]);
        assert!(editor.run_follow_up(follow_up));
        assert_eq!(lines(&editor), vec!["1. first", "2. "]);
        assert_eq!(editor.caret_offset(), Some(12));
    }

    #[test]
    fn test_list_continuation_can_be_disabled() {
        let opts = EditorOptions {
            guess_next_line_prefix_on_enter: false,
            ..EditorOptions::default()
        };
        let mut editor = FocusEditor::new("- item", opts);
        caret_at(&mut editor, 6);
        let outcome = editor.execute(EditCommand::InsertNewline);
        assert_eq!(outcome.follow_up, None);
        assert_eq!(lines(&editor), vec!["- item", ""]);
    }

    #[test]
    fn test_tab_and_shift_tab() {
        let mut editor = make_editor("item");
        caret_at(&mut editor, 2);
        let _ = editor.handle_key(&KeyCombo::new(Key::Tab), false);
        assert_eq!(lines(&editor), vec!["it  em"]);
        assert_eq!(editor.caret_offset(), Some(4));

        caret_at(&mut editor, 0);
        let _ = editor.execute(EditCommand::Indent);
        assert_eq!(lines(&editor), vec!["  it  em"]);
        caret_at(&mut editor, 5);
        let _ = editor.handle_key(&KeyCombo::shift(Key::Tab), false);
        assert_eq!(lines(&editor), vec!["it  em"]);
        assert_eq!(editor.caret_offset(), Some(3));
    }

    #[test]
    fn test_outdent_caret_saturates() {
        let mut editor = make_editor("   x");
        caret_at(&mut editor, 1);
        let _ = editor.execute(EditCommand::Outdent);
        assert_eq!(lines(&editor), vec![" x"]);
        assert_eq!(editor.caret_offset(), Some(0));
    }

    #[test]
    fn test_indent_selection_across_blocks() {
        let mut editor = make_editor("a\n\nb\nc");
        editor.caret.select(&editor.doc, Selection::new(0, 4));
        let _ = editor.execute(EditCommand::Indent);
        assert_eq!(lines(&editor), vec!["  a", "", "  b", "c"]);
        assert_eq!(editor.selection(), Some(Selection::new(2, 8)));

        let _ = editor.execute(EditCommand::Outdent);
        assert_eq!(lines(&editor), vec!["a", "", "b", "c"]);
        assert_eq!(editor.selection(), Some(Selection::new(0, 4)));
    }

    #[test]
    fn test_release_tab_at_edges() {
        let opts = EditorOptions {
            release_tab_at_edges: true,
            ..EditorOptions::default()
        };
        let mut editor = FocusEditor::new("ab", opts);
        assert!(!editor.execute(EditCommand::Outdent).suppress_default);
        caret_at(&mut editor, 2);
        assert!(!editor.execute(EditCommand::Indent).suppress_default);
        assert_eq!(editor.to_markdown(), "ab");
        caret_at(&mut editor, 1);
        assert!(editor.execute(EditCommand::Indent).suppress_default);
    }

    #[test]
    fn test_backspace_joins_previous() {
        let mut editor = make_editor("ab\ncd");
        let first = editor.document().first().id();
        caret_at(&mut editor, 3);
        let outcome = editor.execute_now(EditCommand::DeleteBackward);
        assert!(outcome.follow_up.is_some());
        assert_eq!(lines(&editor), vec!["abcd"]);
        assert_eq!(editor.document().first().id(), first);
        assert_eq!(editor.caret_offset(), Some(2));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let mut editor = make_editor("ab");
        let _ = editor.execute_now(EditCommand::DeleteBackward);
        assert_eq!(editor.to_markdown(), "ab");
    }

    #[test]
    fn test_settle_trims_neighbors_only() {
        let mut editor = make_editor("a\nb\nc\nxyz\nd\ne\nf");
        for (i, text) in [(0usize, "a  "), (1, "b "), (4, "d "), (6, "f ")] {
            let doc = &mut editor.doc;
            if let Some(block) = doc.get_mut(i) {
                block.set_text(text);
            }
        }
        caret_at(&mut editor, 12);
        let _ = editor.execute_now(EditCommand::DeleteBackward);
        assert_eq!(lines(&editor), vec!["a  ", "b", "c", "xy", "d", "e", "f "]);
    }

    #[test]
    fn test_delete_forward_joins_next() {
        let mut editor = make_editor("ab\ncd");
        caret_at(&mut editor, 2);
        let _ = editor.execute(EditCommand::DeleteForward);
        assert_eq!(lines(&editor), vec!["abcd"]);
        assert_eq!(editor.caret_offset(), Some(2));
        caret_at(&mut editor, 4);
        let _ = editor.execute(EditCommand::DeleteForward);
        assert_eq!(editor.to_markdown(), "abcd");
    }

    #[test]
    fn test_navigation() {
        let mut editor = make_editor("hello world\nnext");
        let nav = |motion| EditCommand::Navigate {
            motion,
            extend: false,
        };
        let outcome = editor.execute(nav(Motion::WordRight));
        assert!(!outcome.suppress_default);
        assert_eq!(editor.caret_offset(), Some(6));
        let _ = editor.execute(nav(Motion::Down));
        assert_eq!(editor.caret_offset(), Some(16));
        let _ = editor.execute(nav(Motion::Up));
        assert_eq!(editor.caret_offset(), Some(4));
        let _ = editor.execute(nav(Motion::BlockEnd));
        assert_eq!(editor.caret_offset(), Some(11));
        let _ = editor.execute(nav(Motion::Right));
        assert_eq!(editor.caret_offset(), Some(12));
        let _ = editor.execute(nav(Motion::Left));
        assert_eq!(editor.caret_offset(), Some(11));
        let _ = editor.execute(nav(Motion::DocumentEnd));
        assert_eq!(editor.caret_offset(), Some(16));
        let _ = editor.execute(nav(Motion::WordLeft));
        assert_eq!(editor.caret_offset(), Some(12));
    }

    #[test]
    fn test_shift_navigation_extends() {
        let mut editor = make_editor("abc");
        let extend = |motion| EditCommand::Navigate {
            motion,
            extend: true,
        };
        let _ = editor.execute(extend(Motion::Right));
        let _ = editor.execute(extend(Motion::Right));
        assert_eq!(editor.selection(), Some(Selection::new(0, 2)));
        let _ = editor.execute(EditCommand::Navigate {
            motion: Motion::Left,
            extend: false,
        });
        assert_eq!(editor.selection(), None);
        assert_eq!(editor.caret_offset(), Some(0));
    }

    #[test]
    fn test_navigation_does_not_restyle() {
        let mut events: Vec<crate::types::ChangeEvent> = Vec::new();
        let mut editor =
            FocusEditor::with_listener("# a\nb", EditorOptions::default(), &mut events);
        let _ = editor.execute(EditCommand::Navigate {
            motion: Motion::Down,
            extend: false,
        });
        assert!(editor.last_edit().is_none());
        drop(editor);
        assert!(events.is_empty());
    }

    #[test]
    fn test_select_all_then_type() {
        let mut editor = make_editor("a\nb\nc");
        let _ = editor.execute(EditCommand::SelectAll);
        assert_eq!(editor.selection(), Some(Selection::new(0, 5)));
        let _ = editor.insert_text("z");
        assert_eq!(lines(&editor), vec!["z"]);
    }

    #[test]
    fn test_read_only_ignores_mutations() {
        let opts = EditorOptions {
            read_only: true,
            ..EditorOptions::default()
        };
        let mut editor = FocusEditor::new("text", opts);
        let outcome = editor.execute(EditCommand::InsertText("x".into()));
        assert_eq!(outcome, CommandOutcome::ignored());
        let _ = editor.execute(EditCommand::Cut);
        assert_eq!(editor.to_markdown(), "text");

        let _ = editor.execute(EditCommand::Navigate {
            motion: Motion::BlockEnd,
            extend: false,
        });
        assert_eq!(editor.caret_offset(), Some(4));
    }

    #[test]
    fn test_typing_refused_at_limit() {
        let opts = EditorOptions {
            max_text_length: 4,
            ..EditorOptions::default()
        };
        let mut editor = FocusEditor::new("abc", opts);
        caret_at(&mut editor, 3);
        let _ = editor.insert_text("d");
        assert!(!editor.max_length_reached());
        let _ = editor.insert_text("e");
        assert!(editor.max_length_reached());
        assert_eq!(editor.to_markdown(), "abcd");
        let _ = editor.execute(EditCommand::Navigate {
            motion: Motion::Left,
            extend: false,
        });
        assert!(!editor.max_length_reached());
    }

    #[test]
    fn test_undo_redo() {
        let mut editor = make_editor("hello");
        caret_at(&mut editor, 5);
        let _ = editor.insert_text("!");
        assert_eq!(editor.to_markdown(), "hello!");

        let _ = editor.handle_key(&KeyCombo::primary(Key::character("z"), false), false);
        assert_eq!(editor.to_markdown(), "hello");
        assert_eq!(editor.caret_offset(), Some(5));

        let _ = editor.execute(EditCommand::Redo);
        assert_eq!(editor.to_markdown(), "hello!");
        assert_eq!(editor.caret_offset(), Some(6));
    }

    #[test]
    fn test_enter_over_selection_is_one_undo_step() {
        let mut editor = make_editor("abcdef");
        editor.caret.select(&editor.doc, Selection::new(2, 4));
        let _ = editor.execute_now(EditCommand::InsertNewline);
        assert_eq!(lines(&editor), vec!["ab", "ef"]);

        assert!(editor.undo());
        assert_eq!(lines(&editor), vec!["abcdef"]);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_outdent_helper() {
        let mut block = Block::new(BlockId(0), "\t\tx");
        assert_eq!(outdent(&mut block, "  "), 1);
        assert_eq!(block.text(), "\tx");

        let mut block = Block::new(BlockId(0), "x");
        assert_eq!(outdent(&mut block, "  "), 0);
    }
}
