//! focus-editor-core: the live block-styling engine of a distraction-free
//! markdown editor, without any UI framework.
//!
//! This crate provides:
//! - `Document` - the block sequence, one block per line
//! - `classify`, `fence`, `inline`, `render` - pure styling passes
//! - `FocusEditor` - the command processor, caret tracking and undo
//! - Platform traits for the UI binding, clipboard and change listener

pub mod actions;
pub mod block;
pub mod caret;
pub mod classify;
pub mod codec;
pub mod document;
pub mod editor;
pub mod error;
pub mod execute;
pub mod fence;
pub mod inline;
pub mod link;
pub mod options;
pub mod platform;
pub mod render;
pub mod text_helpers;
pub mod types;
pub mod undo;


pub use actions::{EditCommand, Key, KeyCombo, Modifiers, Motion, PastePayload};
pub use block::{Block, BlockId, StructuralTag, hash_source};
pub use caret::CaretTracker;
pub use classify::{ClassifyOptions, classify, is_whitespace_only};
pub use codec::{Decoded, ELLIPSIS};
pub use document::Document;
pub use editor::{CaretSync, FocusEditor, MAX_CARET_ATTEMPTS};
pub use error::{EditorError, PlatformError};
pub use execute::{CommandOutcome, FollowUp};
pub use fence::{FenceRole, scan_fences};
pub use inline::{InlineSpan, SpanKind, detect_spans};
pub use link::{LinkAction, PointerGesture};
pub use options::EditorOptions;
pub use platform::{
    ChangeListener, ClipboardPlatform, CursorPlatform, CursorSync, PlatformSelection,
    RichTextConverter,
};
pub use render::{BlockRender, render_block};
pub use smol_str::SmolStr;
pub use types::{CaretPosition, ChangeEvent, EditInfo, Selection};
pub use undo::{History, Snapshot, UndoManager};
