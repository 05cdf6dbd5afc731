//! Editor configuration.
//!
//! Options are deserialized from the host with camelCase keys; every field
//! has a default so a partial object (or `{}`) is valid.

use serde::{Deserialize, Serialize};

use crate::fence::DEFAULT_MAX_EMPTY_LINES;

/// Default indent unit inserted by Tab.
pub const DEFAULT_INDENT_UNIT: &str = "  ";

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorOptions {
    /// Maximum document length in characters. 0 means unlimited.
    pub max_text_length: usize,
    pub start_caret_at_end: bool,
    /// Global caret offset to start at. Wins over `start_caret_at_end`.
    pub initial_caret_offset: Option<usize>,
    /// Zero-based block index to start in when no offset is given.
    pub initial_active_block: Option<usize>,
    /// Continue list markers and indentation on Enter.
    pub guess_next_line_prefix_on_enter: bool,
    pub indent_unit: String,
    pub read_only: bool,
    pub force_plain_text_on_paste: bool,
    /// Tag blocks with two or more leading spaces as pre-indented.
    pub pre_indent: bool,
    /// Whitespace-only blocks after which an open fence stops marking code.
    pub max_empty_lines: usize,
    pub history_limit: usize,
    /// Leave Tab at the document end (and Shift+Tab at the start) to the
    /// platform so focus can move out of the editor.
    pub release_tab_at_edges: bool,
    /// Only inline-render blocks on demand or when edited.
    pub lazy_render: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_text_length: 0,
            start_caret_at_end: false,
            initial_caret_offset: None,
            initial_active_block: None,
            guess_next_line_prefix_on_enter: true,
            indent_unit: DEFAULT_INDENT_UNIT.to_string(),
            read_only: false,
            force_plain_text_on_paste: false,
            pre_indent: false,
            max_empty_lines: DEFAULT_MAX_EMPTY_LINES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            release_tab_at_edges: false,
            lazy_render: false,
        }
    }
}

impl EditorOptions {
    /// Whether a length limit is in effect.
    pub fn has_length_limit(&self) -> bool {
        self.max_text_length > 0
    }
}
