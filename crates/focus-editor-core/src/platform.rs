//! Platform abstraction traits for editor operations.
//!
//! These traits define the interface between the editing engine and the
//! collaborators around it: the UI binding that owns the real caret, the
//! system clipboard, the rich-paste converter and whoever persists changes.
//! Every trait has a no-op implementation for `()` so headless use needs no
//! setup.

use crate::block::BlockId;
use crate::error::{EditorError, PlatformError};
use crate::types::{CaretPosition, ChangeEvent};

/// Receives the serialized document whenever it changes.
pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}

impl ChangeListener for () {
    fn on_change(&mut self, _event: &ChangeEvent) {}
}

/// Collects every event, mostly useful in tests and replay tools.
impl ChangeListener for Vec<ChangeEvent> {
    fn on_change(&mut self, event: &ChangeEvent) {
        self.push(event.clone());
    }
}

impl<T: ChangeListener> ChangeListener for Option<T> {
    fn on_change(&mut self, event: &ChangeEvent) {
        if let Some(inner) = self {
            inner.on_change(event);
        }
    }
}

impl<T: ChangeListener + ?Sized> ChangeListener for &mut T {
    fn on_change(&mut self, event: &ChangeEvent) {
        (**self).on_change(event);
    }
}

impl<T: ChangeListener + ?Sized> ChangeListener for Box<T> {
    fn on_change(&mut self, event: &ChangeEvent) {
        (**self).on_change(event);
    }
}

/// Platform clipboard operations.
pub trait ClipboardPlatform {
    /// Write plain text to the clipboard.
    fn write_text(&self, text: &str) -> Result<(), PlatformError>;
}

impl ClipboardPlatform for () {
    fn write_text(&self, _text: &str) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Converts rich clipboard content (HTML) into markdown.
pub trait RichTextConverter {
    fn to_markdown(&self, html: &str) -> Result<String, EditorError>;
}

impl RichTextConverter for () {
    fn to_markdown(&self, _html: &str) -> Result<String, EditorError> {
        Err(EditorError::Conversion("no rich text converter configured".into()))
    }
}

/// Caret or selection as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSelection {
    Caret(CaretPosition),
    Range {
        anchor: CaretPosition,
        head: CaretPosition,
    },
}

/// Reads the current caret/selection from the platform UI.
///
/// This is the inverse of [`CursorPlatform`].
pub trait CursorSync {
    /// `Ok(None)` when the platform selection is outside the editor.
    fn read_selection(&self) -> Result<Option<PlatformSelection>, PlatformError>;
}

impl CursorSync for () {
    fn read_selection(&self) -> Result<Option<PlatformSelection>, PlatformError> {
        Ok(None)
    }
}

/// Places the caret in the platform UI.
pub trait CursorPlatform {
    /// Put the caret at a visible char offset inside a rendered block.
    fn restore_caret(&mut self, block: BlockId, visible_offset: usize) -> Result<(), PlatformError>;
}

impl CursorPlatform for () {
    fn restore_caret(&mut self, _block: BlockId, _visible_offset: usize) -> Result<(), PlatformError> {
        Ok(())
    }
}
