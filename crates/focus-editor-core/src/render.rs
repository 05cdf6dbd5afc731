//! Block rendering.
//!
//! Walks a block's spans once and writes escaped HTML. Markup characters
//! stay visible inside their decoration, so for ordinary blocks the visible
//! text equals the raw text. Whitespace-only blocks collapse to a line break
//! and report the shrink as a negative delta, which the caret tracker uses
//! to map raw offsets onto what the platform shows.

use std::fmt::{self, Write};

use pulldown_cmark_escape::{FmtWriter, escape_href, escape_html};
use smol_str::SmolStr;

use crate::block::{Block, StructuralTag, hash_source};
use crate::error::EditorError;
use crate::inline::{InlineSpan, SpanKind, detect_spans};
use crate::text_helpers::{char_len, slice_chars};

/// A rendered block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRender {
    /// DOM id of the block element (format: `b-{n}`)
    pub id: SmolStr,

    /// Rendered HTML content (without wrapper element)
    pub html: String,

    /// Classes for the wrapper element
    pub classes: Vec<&'static str>,

    /// Inline spans found in the raw text
    pub spans: Vec<InlineSpan>,

    /// Length of the visible text in chars
    pub visible_len: usize,

    /// Visible length minus raw length
    pub delta: isize,

    /// Hash of source text for quick change detection
    pub source_hash: u64,

    /// Tag the render was produced for
    pub tag: StructuralTag,
}

impl BlockRender {
    /// Map a raw caret offset to the rendered content, clamped.
    pub fn to_visible(&self, raw_offset: usize) -> usize {
        raw_offset
            .saturating_add_signed(self.delta)
            .min(self.visible_len)
    }

    /// Innermost link-like span containing `offset`.
    pub fn link_at(&self, offset: usize) -> Option<&InlineSpan> {
        self.spans
            .iter()
            .rev()
            .find(|s| s.kind.is_link() && s.range.start <= offset && offset < s.range.end)
    }
}

/// Render one block from its current text and tag.
pub fn render_block(block: &Block) -> Result<BlockRender, EditorError> {
    let text = block.text();
    let tag = block.tag();
    let len = char_len(text);

    let mut classes: Vec<&'static str> = tag.css_classes().to_vec();
    if block.is_whitespace_only() {
        classes.extend(StructuralTag::WhitespaceOnly.css_classes());
    }

    let mut html = String::with_capacity(text.len() + 16);
    let (spans, visible_len) = if text.is_empty() || block.is_whitespace_only() {
        html.push_str("<br>");
        (Vec::new(), 0)
    } else if tag.is_code() {
        escape_html(FmtWriter(&mut html), text)?;
        (Vec::new(), len)
    } else {
        let spans = detect_spans(text);
        write_inline(&mut html, text, &spans)?;
        (spans, len)
    };

    if tracing::enabled!(target: "focus::render", tracing::Level::TRACE) {
        tracing::trace!(
            target: "focus::render",
            block = %block.id(),
            spans = spans.len(),
            html = %html,
            "rendered block"
        );
    }

    Ok(BlockRender {
        id: block.id().dom_id(),
        html,
        classes,
        spans,
        visible_len,
        delta: visible_len as isize - len as isize,
        source_hash: hash_source(text),
        tag,
    })
}

fn write_open(out: &mut String, span: &InlineSpan) -> fmt::Result {
    let class = match span.kind {
        SpanKind::Bold => return out.write_str("<b>"),
        SpanKind::Italic => return out.write_str("<i>"),
        SpanKind::Code => return out.write_str("<code>"),
        SpanKind::Strikethrough => return out.write_str("<s>"),
        SpanKind::Link => "link",
        SpanKind::Image => "link image",
        SpanKind::InternalLink => "link internal",
        SpanKind::BareUrl => "link direct",
        SpanKind::FootnoteRef => "page-reference",
    };
    out.write_str("<a href=\"")?;
    escape_href(FmtWriter(&mut *out), span.target.as_deref().unwrap_or_default())?;
    out.write_str("\" class=\"")?;
    out.write_str(class)?;
    out.write_str("\">")
}

fn write_close(out: &mut String, kind: SpanKind) -> fmt::Result {
    out.write_str(match kind {
        SpanKind::Bold => "</b>",
        SpanKind::Italic => "</i>",
        SpanKind::Code => "</code>",
        SpanKind::Strikethrough => "</s>",
        _ => "</a>",
    })
}

/// Write `text` with `spans` (sorted, well nested) applied.
fn write_inline(out: &mut String, text: &str, spans: &[InlineSpan]) -> fmt::Result {
    let mut stack: Vec<&InlineSpan> = Vec::new();
    let mut pos = 0;

    for span in spans {
        while let Some(top) = stack.last() {
            if top.range.end > span.range.start {
                break;
            }
            escape_html(FmtWriter(&mut *out), slice_chars(text, pos..top.range.end))?;
            write_close(out, top.kind)?;
            pos = top.range.end;
            stack.pop();
        }
        escape_html(FmtWriter(&mut *out), slice_chars(text, pos..span.range.start))?;
        write_open(out, span)?;
        pos = span.range.start;
        stack.push(span);
    }

    while let Some(top) = stack.pop() {
        escape_html(FmtWriter(&mut *out), slice_chars(text, pos..top.range.end))?;
        write_close(out, top.kind)?;
        pos = top.range.end;
    }
    escape_html(FmtWriter(&mut *out), slice_chars(text, pos..char_len(text)))
}
