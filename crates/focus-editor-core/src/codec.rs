//! Markdown text ↔ block lines.

/// Appended to text that was cut short.
pub const ELLIPSIS: char = '…';

/// Result of splitting a markdown blob into block lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub lines: Vec<String>,
    pub truncated: bool,
}

/// Join block texts with newlines, trimming trailing whitespace per line.
pub fn to_markdown<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}

/// Cut `text` to at most `max_len` chars plus an ellipsis. `max_len == 0`
/// means unlimited. Returns whether anything was cut.
pub fn truncate(text: &str, max_len: usize) -> (String, bool) {
    if max_len == 0 {
        return (text.to_string(), false);
    }
    match text.char_indices().nth(max_len) {
        Some((byte, _)) => {
            let mut cut = text[..byte].to_string();
            cut.push(ELLIPSIS);
            (cut, true)
        }
        None => (text.to_string(), false),
    }
}

/// Split markdown into block lines, truncating first when over `max_len`.
///
/// Trailing whitespace (including `\r`) is removed from every line; an
/// empty input yields a single empty line.
pub fn decode(text: &str, max_len: usize) -> Decoded {
    let (text, truncated) = truncate(text, max_len);
    let lines = text.split('\n').map(|l| l.trim_end().to_string()).collect();
    Decoded { lines, truncated }
}

/// Block lines of text being inserted, with `\r` line endings stripped.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect()
}
