//! The block sequence.
//!
//! `Document` owns every block, the active-block marker and the truncation
//! flag. It is never empty: removing the last block leaves one empty block.
//! Linear offsets count each block's chars plus one separator per block
//! boundary, matching the newline-joined serialization.

use crate::block::{Block, BlockId};
use crate::codec;
use crate::types::CaretPosition;

#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    active: Option<BlockId>,
    next_id: u64,
    truncated: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with one empty block.
    pub fn new() -> Self {
        Self::from_lines([""])
    }

    /// Build from lines; an empty iterator yields one empty block.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self {
            blocks: Vec::new(),
            active: None,
            next_id: 0,
            truncated: false,
        };
        for line in lines {
            let id = doc.alloc_id();
            doc.blocks.push(Block::new(id, line));
        }
        if doc.blocks.is_empty() {
            let id = doc.alloc_id();
            doc.blocks.push(Block::new(id, ""));
        }
        doc
    }

    fn alloc_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn first(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Id of the block at `index`, if any.
    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.blocks.get(index).map(Block::id)
    }

    /// Insert a new block at `index` (clamped) and return its id.
    pub(crate) fn insert(&mut self, index: usize, text: impl Into<String>) -> BlockId {
        let id = self.alloc_id();
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, Block::new(id, text));
        id
    }

    /// Remove a block. Removing the only block replaces it with an empty one.
    pub(crate) fn remove(&mut self, id: BlockId) -> Option<Block> {
        let index = self.index_of(id)?;
        let removed = self.blocks.remove(index);
        if self.blocks.is_empty() {
            let fresh = self.alloc_id();
            self.blocks.push(Block::new(fresh, ""));
        }
        if self.active == Some(id) {
            self.active = None;
        }
        Some(removed)
    }

    /// Block holding the caret, if the editor has focus.
    pub fn active(&self) -> Option<BlockId> {
        self.active
    }

    pub fn is_active(&self, id: BlockId) -> bool {
        self.active == Some(id)
    }

    /// Set the active block. Unknown ids clear the marker.
    pub(crate) fn set_active(&mut self, id: Option<BlockId>) {
        self.active = id.filter(|id| self.contains(*id));
    }

    /// Whether the text was cut short to fit the length limit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn set_truncated(&mut self, truncated: bool) {
        self.truncated = truncated;
    }

    /// Block texts in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(Block::text)
    }

    /// Block texts joined with newlines, untrimmed.
    pub fn raw_text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    /// Total length in chars, newline-joined.
    pub fn text_len(&self) -> usize {
        let chars: usize = self.blocks.iter().map(Block::len).sum();
        chars + self.blocks.len() - 1
    }

    /// True when every block is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.lines().all(|l| l.trim().is_empty())
    }

    /// Global offset of the first char of block `index`.
    pub fn block_start(&self, index: usize) -> usize {
        self.blocks[..index.min(self.blocks.len())]
            .iter()
            .map(|b| b.len() + 1)
            .sum()
    }

    /// Linear offset of a caret position; the in-block offset is clamped.
    pub fn global_offset(&self, pos: &CaretPosition) -> Option<usize> {
        let index = self.index_of(pos.block)?;
        let len = self.blocks[index].len();
        Some(self.block_start(index) + pos.offset.min(len))
    }

    /// Caret position for a linear offset, clamped to the document end.
    pub fn position_at(&self, global: usize) -> CaretPosition {
        let mut remaining = global;
        for block in &self.blocks {
            let len = block.len();
            if remaining <= len {
                return CaretPosition::new(block.id(), remaining);
            }
            remaining -= len + 1;
        }
        let last = self.last();
        CaretPosition::new(last.id(), last.len())
    }

    /// Serialize to markdown.
    pub fn to_markdown(&self) -> String {
        codec::to_markdown(self.lines())
    }

    /// Replace the content with `lines`, reusing blocks where possible.
    ///
    /// Blocks in the unchanged prefix and suffix keep their identity and
    /// render cache. Changed blocks in between are rewritten in place where
    /// counts allow; the rest are inserted or removed. Returns the ids of
    /// blocks whose text changed or that are new.
    pub(crate) fn replace_lines(&mut self, mut lines: Vec<String>) -> Vec<BlockId> {
        if lines.is_empty() {
            lines.push(String::new());
        }

        let old_len = self.blocks.len();
        let new_len = lines.len();
        let prefix = self
            .blocks
            .iter()
            .zip(&lines)
            .take_while(|(b, l)| b.text() == l.as_str())
            .count();
        let max_suffix = old_len.min(new_len) - prefix;
        let suffix = self.blocks[prefix..]
            .iter()
            .rev()
            .zip(lines[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(b, l)| b.text() == l.as_str())
            .count();

        let old_mid = old_len - prefix - suffix;
        let new_mid: Vec<String> = lines.drain(prefix..new_len - suffix).collect();
        let mut dirty = Vec::with_capacity(new_mid.len());

        let reused = old_mid.min(new_mid.len());
        let mut new_mid = new_mid.into_iter();
        for i in 0..reused {
            if let Some(text) = new_mid.next() {
                let block = &mut self.blocks[prefix + i];
                block.set_text(text);
                dirty.push(block.id());
            }
        }
        if old_mid > reused {
            let removed: Vec<BlockId> = self.blocks[prefix + reused..prefix + old_mid]
                .iter()
                .map(Block::id)
                .collect();
            self.blocks.drain(prefix + reused..prefix + old_mid);
            if self.active.is_some_and(|a| removed.contains(&a)) {
                self.active = None;
            }
        }
        for (i, text) in new_mid.enumerate() {
            let id = self.insert(prefix + reused + i, text);
            dirty.push(id);
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Document {
        Document::from_lines(lines.iter().copied())
    }

    #[test]
    fn test_never_empty() {
        let d = Document::from_lines(Vec::<String>::new());
        assert_eq!(d.block_count(), 1);
        assert_eq!(d.first().text(), "");

        let mut d = doc(&["only"]);
        let id = d.first().id();
        assert!(d.remove(id).is_some());
        assert_eq!(d.block_count(), 1);
        assert_ne!(d.first().id(), id);
    }

    #[test]
    fn test_ids_survive_neighbor_edits() {
        let mut d = doc(&["a", "b", "c"]);
        let b = d.id_at(1).unwrap();
        d.insert(0, "new");
        let a = d.id_at(1).unwrap();
        d.remove(a);
        assert_eq!(d.block(b).unwrap().text(), "b");
        assert_eq!(d.index_of(b), Some(1));
    }

    #[test]
    fn test_offset_conversion() {
        let d = doc(&["ab", "", "cde"]);
        assert_eq!(d.text_len(), 7);
        let c = d.id_at(2).unwrap();
        assert_eq!(d.global_offset(&CaretPosition::new(c, 1)), Some(5));
        assert_eq!(d.position_at(5), CaretPosition::new(c, 1));
        assert_eq!(d.position_at(3), CaretPosition::new(d.id_at(1).unwrap(), 0));
        assert_eq!(d.position_at(2), CaretPosition::new(d.id_at(0).unwrap(), 2));
        assert_eq!(d.position_at(99), CaretPosition::new(c, 3));
        // Offsets past a block's end clamp.
        assert_eq!(d.global_offset(&CaretPosition::new(c, 42)), Some(7));
    }

    #[test]
    fn test_active_marker() {
        let mut d = doc(&["a", "b"]);
        let b = d.id_at(1).unwrap();
        d.set_active(Some(b));
        assert!(d.is_active(b));
        d.remove(b);
        assert_eq!(d.active(), None);
        d.set_active(Some(b));
        assert_eq!(d.active(), None);
    }

    #[test]
    fn test_replace_lines_keeps_unchanged_blocks() {
        let mut d = doc(&["a", "b", "c", "d"]);
        let ids: Vec<BlockId> = d.blocks().iter().map(Block::id).collect();

        let dirty = d.replace_lines(vec!["a".into(), "x".into(), "y".into(), "z".into(), "d".into()]);
        assert_eq!(d.lines().collect::<Vec<_>>(), vec!["a", "x", "y", "z", "d"]);
        assert_eq!(d.id_at(0), Some(ids[0]));
        assert_eq!(d.id_at(4), Some(ids[3]));
        // Changed middle blocks are rewritten in place, the extra one is new.
        assert_eq!(d.id_at(1), Some(ids[1]));
        assert_eq!(d.id_at(2), Some(ids[2]));
        assert_eq!(dirty.len(), 3);
    }

    #[test]
    fn test_replace_lines_shrinks() {
        let mut d = doc(&["a", "b", "c"]);
        let dirty = d.replace_lines(vec!["a".into()]);
        assert!(dirty.is_empty());
        assert_eq!(d.block_count(), 1);

        let dirty = d.replace_lines(Vec::new());
        assert_eq!(d.lines().collect::<Vec<_>>(), vec![""]);
        assert_eq!(dirty.len(), 1);
    }

    #[test]
    fn test_is_blank() {
        assert!(doc(&["", "  "]).is_blank());
        assert!(!doc(&["", "x"]).is_blank());
    }
}
