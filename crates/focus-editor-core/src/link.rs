//! Link activation.
//!
//! Links stay editable text: a plain click only places the caret. A click
//! with Ctrl, Cmd or Alt held, or a double tap on touch, resolves the span
//! under the pointer into an action for the binding to carry out.

use smol_str::SmolStr;

use crate::actions::Modifiers;
use crate::block::{Block, BlockId};
use crate::document::Document;
use crate::inline::{InlineSpan, SpanKind, detect_spans};
use crate::text_helpers::slice_chars;

/// Pointer input over a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerGesture {
    Click(Modifiers),
    DoubleTap,
}

impl PointerGesture {
    /// Whether this gesture follows links instead of editing.
    pub fn activates_links(&self) -> bool {
        match self {
            PointerGesture::Click(mods) => mods.activates_links(),
            PointerGesture::DoubleTap => true,
        }
    }
}

/// What the binding should do for an activated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Open an absolute URL.
    OpenExternal(SmolStr),
    /// Route to a site path or in-page anchor.
    FollowAnchor(SmolStr),
    /// Move the caret to another block (footnote definition).
    JumpToBlock(BlockId),
}

/// Targets the editor is willing to navigate to.
pub fn is_navigable(target: &str) -> bool {
    ["/", "http://", "https://", "#"]
        .iter()
        .any(|prefix| target.starts_with(prefix))
}

/// Spans of a block, reusing the cached render when it is current.
pub fn spans_of(block: &Block) -> Vec<InlineSpan> {
    if block.tag().is_code() || block.is_whitespace_only() {
        return Vec::new();
    }
    match block.render() {
        Some(render) if !block.needs_render() => render.spans.clone(),
        _ => detect_spans(block.text()),
    }
}

/// Innermost link-like span at a char offset.
pub fn link_at(block: &Block, offset: usize) -> Option<InlineSpan> {
    spans_of(block)
        .into_iter()
        .rev()
        .find(|s| s.kind.is_link() && s.range.start <= offset && offset < s.range.end)
}

/// Resolve an activated span into an action.
pub fn resolve(doc: &Document, source: BlockId, span: &InlineSpan) -> Option<LinkAction> {
    if span.kind == SpanKind::FootnoteRef {
        let reference = slice_chars(doc.block(source)?.text(), span.range.clone());
        if let Some(target) = find_reference(doc, source, reference) {
            return Some(LinkAction::JumpToBlock(target));
        }
    }

    let target = span.target.as_ref()?;
    if !is_navigable(target) {
        tracing::debug!(target: "focus::command", link = %target, "ignoring non-navigable link target");
        return None;
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        Some(LinkAction::OpenExternal(target.clone()))
    } else {
        Some(LinkAction::FollowAnchor(target.clone()))
    }
}

/// The other block holding `reference`, preferring one that starts with it.
fn find_reference(doc: &Document, source: BlockId, reference: &str) -> Option<BlockId> {
    let others = || doc.blocks().iter().filter(|b| b.id() != source);
    others()
        .find(|b| b.text().trim_start().starts_with(reference))
        .or_else(|| others().find(|b| b.text().contains(reference)))
        .map(Block::id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Document {
        Document::from_lines(lines.iter().copied())
    }

    #[test]
    fn test_plain_click_is_inert() {
        assert!(!PointerGesture::Click(Modifiers::NONE).activates_links());
        assert!(!PointerGesture::Click(Modifiers::SHIFT).activates_links());
        assert!(PointerGesture::Click(Modifiers::META).activates_links());
        assert!(PointerGesture::Click(Modifiers::ALT).activates_links());
        assert!(PointerGesture::DoubleTap.activates_links());
    }

    #[test]
    fn test_navigable_targets() {
        assert!(is_navigable("https://a.io"));
        assert!(is_navigable("/notes/x"));
        assert!(is_navigable("#/path"));
        assert!(!is_navigable("javascript:alert(1)"));
        assert!(!is_navigable("relative.md"));
    }

    #[test]
    fn test_resolve_external_and_anchor() {
        let d = doc(&["see [x](https://a.io) and #/inbox"]);
        let id = d.first().id();
        let block = d.first();

        let span = link_at(block, 5).unwrap();
        assert_eq!(
            resolve(&d, id, &span),
            Some(LinkAction::OpenExternal("https://a.io".into()))
        );

        let span = link_at(block, 28).unwrap();
        assert_eq!(span.kind, SpanKind::InternalLink);
        assert_eq!(
            resolve(&d, id, &span),
            Some(LinkAction::FollowAnchor("#/inbox".into()))
        );
        assert!(link_at(block, 0).is_none());
    }

    #[test]
    fn test_relative_target_is_ignored() {
        let d = doc(&["[x](notes.md)"]);
        let span = link_at(d.first(), 1).unwrap();
        assert_eq!(resolve(&d, d.first().id(), &span), None);
    }

    #[test]
    fn test_footnote_jumps_to_definition() {
        let d = doc(&["claim[^src] here", "", "[^src]: the source"]);
        let source = d.first().id();
        let span = link_at(d.first(), 6).unwrap();
        assert_eq!(span.kind, SpanKind::FootnoteRef);
        assert_eq!(
            resolve(&d, source, &span),
            Some(LinkAction::JumpToBlock(d.id_at(2).unwrap()))
        );
    }

    #[test]
    fn test_footnote_without_definition_follows_anchor() {
        let d = doc(&["claim[^src]"]);
        let span = link_at(d.first(), 6).unwrap();
        assert_eq!(
            resolve(&d, d.first().id(), &span),
            Some(LinkAction::FollowAnchor("#src".into()))
        );
    }
}
