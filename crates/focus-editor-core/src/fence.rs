//! Fenced code block scanner.
//!
//! A whole-document pass that pairs fence lines. A line whose trimmed text
//! starts with ```` ``` ```` opens a fence when none is open; while a fence is
//! open, the next line whose trimmed text ends with ```` ``` ```` closes it.
//! Fences do not nest. An opening line with no closing line never marks
//! anything.

use crate::block::StructuralTag;
use crate::classify::is_whitespace_only;

pub const FENCE_MARKER: &str = "```";

/// Default run of whitespace-only lines after which a fence stops marking.
pub const DEFAULT_MAX_EMPTY_LINES: usize = 50;

/// Position of a block within a matched fence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceRole {
    Start,
    Interior,
    End,
}

impl FenceRole {
    pub fn tag(self) -> StructuralTag {
        match self {
            FenceRole::Start => StructuralTag::CodeBlockStart,
            FenceRole::Interior => StructuralTag::CodeBlock,
            FenceRole::End => StructuralTag::CodeBlockEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Begin(usize),
    End(usize),
}

/// Compute the fence role of every line.
///
/// Inside a matched pair, more than `max_empty_lines` consecutive
/// whitespace-only lines end the code region early; the rest of the pair,
/// closing line included, gets no role.
pub fn scan_fences<'a, I>(lines: I, max_empty_lines: usize) -> Vec<Option<FenceRole>>
where
    I: IntoIterator<Item = &'a str>,
{
    let lines: Vec<&str> = lines.into_iter().collect();
    let mut roles = vec![None; lines.len()];

    let mut markers = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let open = matches!(markers.last(), Some(Marker::Begin(_)));
        if !open && trimmed.starts_with(FENCE_MARKER) {
            markers.push(Marker::Begin(i));
        } else if open && trimmed.ends_with(FENCE_MARKER) {
            markers.push(Marker::End(i));
        }
    }

    for pair in markers.chunks(2) {
        let [Marker::Begin(start), Marker::End(end)] = pair else {
            continue;
        };
        roles[*start] = Some(FenceRole::Start);

        let mut empty_run = 0;
        let mut closed = true;
        for i in start + 1..*end {
            if is_whitespace_only(lines[i]) {
                empty_run += 1;
                if empty_run > max_empty_lines {
                    closed = false;
                    break;
                }
            } else {
                empty_run = 0;
            }
            roles[i] = Some(FenceRole::Interior);
        }

        if closed {
            roles[*end] = Some(FenceRole::End);
        } else {
            // The whitespace run that ended the region is not code either.
            trim_trailing_blank_interior(&mut roles, &lines, *start, *end);
        }
    }

    roles
}

fn trim_trailing_blank_interior(
    roles: &mut [Option<FenceRole>],
    lines: &[&str],
    start: usize,
    end: usize,
) {
    let mut i = end;
    while i > start + 1 {
        i -= 1;
        if roles[i].is_none() {
            continue;
        }
        if is_whitespace_only(lines[i]) {
            roles[i] = None;
        } else {
            break;
        }
    }
}
