//! Blocks: one editable line of the document.
//!
//! A block owns its raw text, which is the only authoritative state. The
//! structural tag, whitespace flag and cached render are derived and get
//! recomputed by the refresh pipeline whenever the text changes.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use smol_str::{SmolStr, format_smolstr};

use crate::render::BlockRender;
use crate::text_helpers::char_len;

/// Stable block handle.
///
/// Allocated from a per-document counter, so a handle stays valid while
/// other blocks are inserted or removed around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u64);

impl BlockId {
    /// DOM id for bindings (format: `b-{n}`).
    pub fn dom_id(&self) -> SmolStr {
        format_smolstr!("b-{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b-{}", self.0)
    }
}

/// Block-level classification.
///
/// One tag per block. `WhitespaceOnly` is never stored as the tag itself;
/// it is a separate flag reported alongside the tag by [`Block::tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StructuralTag {
    #[default]
    None,
    /// Heading level 1..=6.
    Heading(u8),
    ListItem,
    Blockquote,
    HorizontalRule,
    PreIndented,
    CodeBlock,
    CodeBlockStart,
    CodeBlockEnd,
    WhitespaceOnly,
}

impl StructuralTag {
    /// Tags assigned by the fence scanner rather than the classifier.
    pub fn is_code(&self) -> bool {
        matches!(
            self,
            StructuralTag::CodeBlock | StructuralTag::CodeBlockStart | StructuralTag::CodeBlockEnd
        )
    }

    /// CSS classes a binding applies to the block element.
    pub fn css_classes(&self) -> &'static [&'static str] {
        match self {
            StructuralTag::None => &[],
            StructuralTag::Heading(1) => &["heading", "h1"],
            StructuralTag::Heading(2) => &["heading", "h2"],
            StructuralTag::Heading(3) => &["heading", "h3"],
            StructuralTag::Heading(4) => &["heading", "h4"],
            StructuralTag::Heading(5) => &["heading", "h5"],
            StructuralTag::Heading(_) => &["heading", "h6"],
            StructuralTag::ListItem => &["list-item"],
            StructuralTag::Blockquote => &["blockquote"],
            StructuralTag::HorizontalRule => &["hr"],
            StructuralTag::PreIndented => &["pre-indent"],
            StructuralTag::CodeBlock => &["fenced-code-block"],
            StructuralTag::CodeBlockStart => &["fenced-code-block", "first-fenced-code-block"],
            StructuralTag::CodeBlockEnd => &["fenced-code-block", "last-fenced-code-block"],
            StructuralTag::WhitespaceOnly => &["white-space"],
        }
    }
}

/// One line of the document.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    text: String,
    pub(crate) tag: StructuralTag,
    pub(crate) whitespace_only: bool,
    pub(crate) render: Option<BlockRender>,
}

impl Block {
    pub(crate) fn new(id: BlockId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            tag: StructuralTag::None,
            whitespace_only: false,
            render: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text length in chars.
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn tag(&self) -> StructuralTag {
        self.tag
    }

    pub fn is_whitespace_only(&self) -> bool {
        self.whitespace_only
    }

    /// The tag set: the structural tag (unless `None`) plus `WhitespaceOnly`
    /// when flagged.
    pub fn tags(&self) -> Vec<StructuralTag> {
        let mut tags = Vec::with_capacity(2);
        if self.tag != StructuralTag::None {
            tags.push(self.tag);
        }
        if self.whitespace_only {
            tags.push(StructuralTag::WhitespaceOnly);
        }
        tags
    }

    /// Last render, if the block has been rendered.
    pub fn render(&self) -> Option<&BlockRender> {
        self.render.as_ref()
    }

    /// Whether the cached render is out of date with the text.
    pub fn needs_render(&self) -> bool {
        match &self.render {
            Some(render) => render.source_hash != hash_source(&self.text) || render.tag != self.tag,
            None => true,
        }
    }

    pub(crate) fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// Simple hash function for source text comparison.
///
/// Used to quickly detect if block content has changed since its last render.
pub fn hash_source(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
