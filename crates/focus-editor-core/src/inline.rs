//! Inline span detection.
//!
//! Spans are computed over a block's raw text by ordered pattern passes.
//! A later pass never decorates across the boundary of an earlier span:
//! a candidate is dropped when it is escaped with `\`, when it starts where
//! an earlier span starts or ends, or when it straddles an earlier span.
//! Fully nesting inside (or around) an earlier span is allowed, except that
//! link-like spans never nest in each other.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use smol_str::{SmolStr, ToSmolStr, format_smolstr};

use crate::text_helpers::slugify;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*[^*]+?\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*[^\s*][^*]*\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").unwrap());
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~[^~]+.*?~~").unwrap());
static INTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#/\S+").unwrap());
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+?)\]\((.+?)\)").unwrap());
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=;]*)",
    )
    .unwrap()
});
static FOOTNOTE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\^([^\]]+?)\]").unwrap());

/// Kind of inline decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Bold,
    Italic,
    Code,
    Strikethrough,
    /// `[title](url)`
    Link,
    /// `![title](url)`
    Image,
    /// `#/path`
    InternalLink,
    /// A bare `http(s)://` URL.
    BareUrl,
    /// `[^name]`
    FootnoteRef,
}

impl SpanKind {
    /// Spans that carry a navigation target.
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            SpanKind::Link
                | SpanKind::Image
                | SpanKind::InternalLink
                | SpanKind::BareUrl
                | SpanKind::FootnoteRef
        )
    }
}

/// A decorated sub-range of a block's text, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub kind: SpanKind,
    pub range: Range<usize>,
    /// Link target for link-like spans.
    pub target: Option<SmolStr>,
}

struct Candidate {
    kind: SpanKind,
    range: Range<usize>,
    target: Option<SmolStr>,
}

fn prev_char(text: &str, byte: usize) -> Option<char> {
    text[..byte].chars().next_back()
}

fn next_char(text: &str, byte: usize) -> Option<char> {
    text[byte..].chars().next()
}

/// Run `re` over `text`, offering each match to `check`. A rejected match
/// restarts the search one char later so overlapping candidates still get
/// a chance.
fn scan<F>(re: &Regex, text: &str, spans: &mut Vec<Candidate>, mut check: F)
where
    F: FnMut(&str, &regex::Captures<'_>) -> Option<Candidate>,
{
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };
        let accepted = check(text, &caps).filter(|c| fits(spans, c));
        match accepted {
            Some(candidate) => {
                spans.push(candidate);
                pos = m.end().max(m.start() + 1);
            }
            None => {
                pos = m.start() + next_char(text, m.start()).map_or(1, char::len_utf8);
            }
        }
    }
}

fn fits(spans: &[Candidate], candidate: &Candidate) -> bool {
    let r = &candidate.range;
    spans.iter().all(|s| {
        let overlaps = s.range.start < r.end && r.start < s.range.end;
        let nested = (s.range.start <= r.start && r.end <= s.range.end)
            || (r.start <= s.range.start && s.range.end <= r.end);
        let touches = r.start == s.range.start || r.start == s.range.end;
        let both_links = s.kind.is_link() && candidate.kind.is_link();
        !touches && !(overlaps && (!nested || both_links))
    })
}

fn simple(kind: SpanKind, caps: &regex::Captures<'_>) -> Option<Candidate> {
    let m = caps.get(0)?;
    Some(Candidate {
        kind,
        range: m.range(),
        target: None,
    })
}

/// Detect all inline spans of one block's text.
///
/// Returned spans are sorted by start, outermost first, with char ranges.
pub fn detect_spans(text: &str) -> Vec<InlineSpan> {
    let mut found: Vec<Candidate> = Vec::new();

    scan(&BOLD, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if prev_char(text, m.start()) == Some('\\') {
            return None;
        }
        simple(SpanKind::Bold, caps)
    });

    scan(&ITALIC, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if matches!(prev_char(text, m.start()), Some('\\' | '*'))
            || next_char(text, m.end()) == Some('*')
        {
            return None;
        }
        simple(SpanKind::Italic, caps)
    });

    scan(&CODE, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if matches!(prev_char(text, m.start()), Some('\\' | '`'))
            || next_char(text, m.end()) == Some('`')
        {
            return None;
        }
        simple(SpanKind::Code, caps)
    });

    scan(&STRIKETHROUGH, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if matches!(prev_char(text, m.start()), Some('\\' | '~'))
            || next_char(text, m.end()) == Some('~')
        {
            return None;
        }
        simple(SpanKind::Strikethrough, caps)
    });

    scan(&INTERNAL_LINK, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if prev_char(text, m.start()).is_some_and(|c| !c.is_whitespace()) {
            return None;
        }
        Some(Candidate {
            kind: SpanKind::InternalLink,
            range: m.range(),
            target: Some(m.as_str().to_smolstr()),
        })
    });

    scan(&MARKDOWN_LINK, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        let url = caps.get(2)?.as_str().to_smolstr();
        match prev_char(text, m.start()) {
            Some('\\') => None,
            Some('!') => Some(Candidate {
                kind: SpanKind::Image,
                range: m.start() - 1..m.end(),
                target: Some(url),
            }),
            _ => Some(Candidate {
                kind: SpanKind::Link,
                range: m.range(),
                target: Some(url),
            }),
        }
    });

    scan(&BARE_URL, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if matches!(
            prev_char(text, m.start()),
            Some('>' | '[' | '(' | '"' | '\'' | '\\')
        ) || m.as_str().ends_with(';')
        {
            return None;
        }
        Some(Candidate {
            kind: SpanKind::BareUrl,
            range: m.range(),
            target: Some(m.as_str().to_smolstr()),
        })
    });

    scan(&FOOTNOTE_REF, text, &mut found, |text, caps| {
        let m = caps.get(0)?;
        if matches!(
            prev_char(text, m.start()),
            Some('>' | '[' | ']' | ')' | '(' | '"' | '\'' | '\\')
        ) {
            return None;
        }
        let name = caps.get(1)?.as_str();
        Some(Candidate {
            kind: SpanKind::FootnoteRef,
            range: m.range(),
            target: Some(format_smolstr!("#{}", slugify(name))),
        })
    });

    let mut spans: Vec<InlineSpan> = found
        .into_iter()
        .map(|c| InlineSpan {
            kind: c.kind,
            range: byte_to_char(text, c.range.start)..byte_to_char(text, c.range.end),
            target: c.target,
        })
        .collect();
    spans.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });
    spans
}

fn byte_to_char(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(SpanKind, Range<usize>)> {
        detect_spans(text)
            .into_iter()
            .map(|s| (s.kind, s.range))
            .collect()
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(kinds("**bold**"), vec![(SpanKind::Bold, 0..8)]);
        assert_eq!(kinds("an *em* word"), vec![(SpanKind::Italic, 3..7)]);
        assert_eq!(kinds("a *x* b"), vec![(SpanKind::Italic, 2..5)]);
    }

    #[test]
    fn test_italic_after_bold_is_found() {
        assert_eq!(
            kinds("a**b**c *d*"),
            vec![(SpanKind::Bold, 1..6), (SpanKind::Italic, 8..11)]
        );
    }

    #[test]
    fn test_italic_needs_non_whitespace_after_opener() {
        assert!(kinds("a * b * c").is_empty());
        assert!(kinds("2*3 = 6").is_empty());
    }

    #[test]
    fn test_escaped_markers() {
        assert!(kinds(r"\**not bold**").is_empty());
        assert!(kinds(r"\`code`").is_empty());
        assert!(kinds(r"\~~gone~~").is_empty());
    }

    #[test]
    fn test_code_and_strikethrough() {
        assert_eq!(kinds("use `x` here"), vec![(SpanKind::Code, 4..7)]);
        assert_eq!(kinds("~~old~~ new"), vec![(SpanKind::Strikethrough, 0..7)]);
        assert!(kinds("``").is_empty());
    }

    #[test]
    fn test_nested_code_in_bold() {
        assert_eq!(
            kinds("**a `b` c**"),
            vec![(SpanKind::Bold, 0..11), (SpanKind::Code, 4..7)]
        );
    }

    #[test]
    fn test_link_escaping() {
        assert!(kinds(r"\[x](y)").is_empty());
        let spans = detect_spans("[x](y)");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Link);
        assert_eq!(spans[0].target.as_deref(), Some("y"));
    }

    #[test]
    fn test_image_includes_bang() {
        let spans = detect_spans("see ![cat](cat.png)");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Image);
        assert_eq!(spans[0].range, 4..19);
        assert_eq!(spans[0].target.as_deref(), Some("cat.png"));
    }

    #[test]
    fn test_internal_link_at_word_boundary() {
        let spans = detect_spans("go to #/notes/today now");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::InternalLink);
        assert_eq!(spans[0].target.as_deref(), Some("#/notes/today"));
        assert!(kinds("a#/b").is_empty());
    }

    #[test]
    fn test_bare_url() {
        let spans = detect_spans("visit https://example.com/path?q=1 today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::BareUrl);
        assert_eq!(
            spans[0].target.as_deref(),
            Some("https://example.com/path?q=1")
        );
    }

    #[test]
    fn test_url_inside_link_is_not_doubled() {
        let spans = detect_spans("[https://a.com](https://a.com)");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Link);
    }

    #[test]
    fn test_footnote_ref() {
        let spans = detect_spans("claim[^My Source] and more");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::FootnoteRef);
        assert_eq!(spans[0].range, 5..17);
        assert_eq!(spans[0].target.as_deref(), Some("#my-source"));
    }

    #[test]
    fn test_footnote_shaped_link_stays_link() {
        assert_eq!(kinds("[^1](x)"), vec![(SpanKind::Link, 0..7)]);
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        assert_eq!(kinds("é **b**"), vec![(SpanKind::Bold, 2..7)]);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let text = "**a** *b* `c` ~~d~~ [e](f) https://g.io [^h]";
        assert_eq!(detect_spans(text), detect_spans(text));
        assert_eq!(detect_spans(text).len(), 7);
    }
}
