//! Block classifier.
//!
//! A pure function from one block's text to its structural tag. Rules are
//! tried in priority order; the first match wins. Reclassifying a block
//! replaces whatever tag it had, so edits that break the syntax also drop
//! the decoration.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, StructuralTag};

static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(_{3,}|-{3,}|\*{3,})$").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+").unwrap());
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s+").unwrap());
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([*\-•+>|]|\d+\.)\s+").unwrap());

/// Classifier switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Tag lines with two or more leading spaces as pre-indented.
    pub pre_indent: bool,
}

/// Classify one block's text.
///
/// Horizontal rule, heading and blockquote are matched against the text
/// trimmed at both ends; list items allow leading whitespace. Pre-indent
/// looks at the untrimmed text and only applies when enabled.
pub fn classify(text: &str, options: ClassifyOptions) -> StructuralTag {
    let trimmed = text.trim();

    if HORIZONTAL_RULE.is_match(trimmed) {
        return StructuralTag::HorizontalRule;
    }
    if let Some(caps) = HEADING.captures(trimmed) {
        return StructuralTag::Heading(caps[1].len() as u8);
    }
    if BLOCKQUOTE.is_match(trimmed) {
        return StructuralTag::Blockquote;
    }
    if LIST_ITEM.is_match(trimmed) {
        return StructuralTag::ListItem;
    }
    if options.pre_indent && text.starts_with("  ") && !trimmed.is_empty() {
        return StructuralTag::PreIndented;
    }
    StructuralTag::None
}

/// Empty or whitespace-only text.
pub fn is_whitespace_only(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Reclassify a block that the fence scanner left alone. Returns whether
/// the tag or whitespace flag changed.
pub fn reclassify(block: &mut Block, options: ClassifyOptions) -> bool {
    let tag = classify(block.text(), options);
    let whitespace_only = !block.is_empty() && is_whitespace_only(block.text());
    let changed = block.tag != tag || block.whitespace_only != whitespace_only;
    block.tag = tag;
    block.whitespace_only = whitespace_only;
    changed
}
