//! Text navigation and analysis helpers.
//!
//! All offsets are character offsets within a single block's text. Functions
//! clamp out-of-range offsets instead of panicking.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static UNORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([*\-·•+>|])\s+").unwrap());
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)(\d+)([.)])\s+").unwrap());
static INDENTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([ \t]{2,})").unwrap());
static EMPTY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([*\-·•+>|]|\d+[.)])\s*$").unwrap());

/// Number of chars in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of a char offset, clamped to the end of `s`.
pub fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Split at a char offset.
pub fn split_at_char(s: &str, char_offset: usize) -> (&str, &str) {
    s.split_at(char_to_byte(s, char_offset))
}

/// Slice by a char range, clamped.
pub fn slice_chars(s: &str, range: Range<usize>) -> &str {
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end.max(range.start));
    &s[start..end]
}

/// Insert `text` at a char offset.
pub fn insert_at_char(s: &mut String, char_offset: usize, text: &str) {
    let byte = char_to_byte(s, char_offset);
    s.insert_str(byte, text);
}

/// Remove a char range, returning what was removed.
pub fn remove_chars(s: &mut String, range: Range<usize>) -> String {
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end.max(range.start));
    s.drain(start..end).collect()
}

/// Leading spaces and tabs.
pub fn leading_indent(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find word boundary backward from cursor.
pub fn find_word_boundary_backward(s: &str, cursor: usize) -> usize {
    let chars: Vec<char> = s.chars().collect();
    let mut pos = cursor.min(chars.len());

    // Skip any whitespace/punctuation immediately before cursor.
    while pos > 0 && !is_word_char(chars[pos - 1]) {
        pos -= 1;
    }
    while pos > 0 && is_word_char(chars[pos - 1]) {
        pos -= 1;
    }
    pos
}

/// Find word boundary forward from cursor.
pub fn find_word_boundary_forward(s: &str, cursor: usize) -> usize {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut pos = cursor.min(len);

    while pos < len && is_word_char(chars[pos]) {
        pos += 1;
    }
    // Then skip whitespace/punctuation.
    while pos < len && !is_word_char(chars[pos]) {
        pos += 1;
    }
    pos
}

/// What kind of list line a block is, for continuation on Enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListContext {
    /// Bullet-style marker (`-`, `*`, `+`, `•`, `·`, `>`, `|`).
    Unordered { indent: String, marker: char },
    /// Numbered marker such as `3.` or `3)`.
    Ordered {
        indent: String,
        number: usize,
        delimiter: char,
    },
    /// Plain line indented by two or more spaces.
    Indented { indent: String },
}

impl ListContext {
    /// Prefix to seed the following line with.
    pub fn continuation(&self) -> String {
        match self {
            ListContext::Unordered { indent, marker } => format!("{indent}{marker} "),
            ListContext::Ordered {
                indent,
                number,
                delimiter,
            } => format!("{indent}{}{delimiter} ", number + 1),
            ListContext::Indented { indent } => indent.clone(),
        }
    }
}

/// Detect a list marker (or plain indentation) at the start of a line.
pub fn detect_list_context(line: &str) -> Option<ListContext> {
    if let Some(caps) = UNORDERED_MARKER.captures(line) {
        let marker = caps[2].chars().next()?;
        return Some(ListContext::Unordered {
            indent: caps[1].to_string(),
            marker,
        });
    }

    if let Some(caps) = ORDERED_MARKER.captures(line) {
        if let Ok(number) = caps[2].parse::<usize>() {
            let delimiter = caps[3].chars().next()?;
            return Some(ListContext::Ordered {
                indent: caps[1].to_string(),
                number,
                delimiter,
            });
        }
    }

    INDENTED.captures(line).map(|caps| ListContext::Indented {
        indent: caps[1].to_string(),
    })
}

/// A line holding only a list marker, with no content after it.
pub fn is_list_item_empty(line: &str) -> bool {
    EMPTY_MARKER.is_match(line)
}

/// Anchor slug for a footnote name: lowercase, dashes for whitespace, word
/// characters only.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            last_dash = false;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
