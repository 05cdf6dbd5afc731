//! Editor commands and input types.
//!
//! Platform-agnostic definitions for the operations the command processor
//! understands. Bindings convert native key events into [`KeyCombo`] and map
//! them with [`EditCommand::from_key`]; pointer and clipboard events build
//! commands directly.

use smol_str::SmolStr;

use crate::types::CaretPosition;

/// Key values (matches the names of the web `KeyboardEvent.key` values).
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    AltGraph,
    CapsLock,
    Control,
    Meta,
    Shift,

    // === IME / composition ===
    Dead,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Alt | Self::AltGraph | Self::CapsLock | Self::Control | Self::Meta | Self::Shift
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Primary modifier held, ignoring the others.
    pub fn has_primary(&self, is_mac: bool) -> bool {
        if is_mac { self.meta } else { self.ctrl }
    }

    /// Any modifier that turns a click on a link into navigation.
    pub fn activates_links(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }

    /// Add Shift to these modifiers.
    pub fn with_shift(self) -> Self {
        Self {
            shift: true,
            ..self
        }
    }
}

/// A key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }
}

/// Caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    WordLeft,
    WordRight,
    /// Previous block, same offset (clamped).
    Up,
    /// Next block, same offset (clamped).
    Down,
    BlockStart,
    BlockEnd,
    DocumentStart,
    DocumentEnd,
    /// No movement; re-asserts the active block.
    Stay,
}

/// Clipboard content offered to paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PastePayload {
    pub plain: String,
    /// Rich content (HTML), when the platform provided it.
    pub html: Option<String>,
    /// Shift was held: paste as plain text.
    pub plain_requested: bool,
}

impl PastePayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain: text.into(),
            ..Self::default()
        }
    }

    pub fn rich(plain: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            plain: plain.into(),
            html: Some(html.into()),
            plain_requested: false,
        }
    }
}

/// All operations the command processor handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Insert text at the caret (typing, IME commit, inline drop).
    InsertText(String),
    /// Enter / Shift+Enter.
    InsertNewline,
    /// Tab.
    Indent,
    /// Shift+Tab.
    Outdent,
    /// Backspace.
    DeleteBackward,
    /// Delete.
    DeleteForward,
    /// Move the caret; `extend` keeps the anchor for a selection.
    Navigate { motion: Motion, extend: bool },
    /// Pointer placement of the caret.
    PlaceCaret(CaretPosition),
    Paste(PastePayload),
    SelectAll,
    /// Cut the selection, or the whole active block when nothing is selected.
    Cut,
    Undo,
    Redo,
}

impl EditCommand {
    /// Whether the command changes text.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            EditCommand::Navigate { .. } | EditCommand::PlaceCaret(_) | EditCommand::SelectAll
        )
    }

    /// Map a key combination to a command.
    ///
    /// Returns `None` for keys the editor leaves to the platform.
    pub fn from_key(combo: &KeyCombo, is_mac: bool) -> Option<Self> {
        let mods = combo.modifiers;
        let primary = mods.has_primary(is_mac);
        let extend = mods.shift;
        let nav = |motion| Some(EditCommand::Navigate { motion, extend });

        match &combo.key {
            Key::Enter => Some(EditCommand::InsertNewline),
            Key::Tab if mods.shift => Some(EditCommand::Outdent),
            Key::Tab => Some(EditCommand::Indent),
            Key::Backspace => Some(EditCommand::DeleteBackward),
            Key::Delete => Some(EditCommand::DeleteForward),

            Key::ArrowLeft if mods.alt || primary => nav(Motion::WordLeft),
            Key::ArrowRight if mods.alt || primary => nav(Motion::WordRight),
            Key::ArrowLeft => nav(Motion::Left),
            Key::ArrowRight => nav(Motion::Right),
            Key::ArrowUp if primary => nav(Motion::DocumentStart),
            Key::ArrowDown if primary => nav(Motion::DocumentEnd),
            Key::ArrowUp | Key::PageUp => nav(Motion::Up),
            Key::ArrowDown | Key::PageDown => nav(Motion::Down),
            Key::Home if primary => nav(Motion::DocumentStart),
            Key::End if primary => nav(Motion::DocumentEnd),
            Key::Home => nav(Motion::BlockStart),
            Key::End => nav(Motion::BlockEnd),
            key if key.is_modifier() => nav(Motion::Stay),

            Key::Character(c) if primary => match c.to_lowercase().as_str() {
                "a" => Some(EditCommand::SelectAll),
                "x" => Some(EditCommand::Cut),
                "z" if mods.shift => Some(EditCommand::Redo),
                "z" => Some(EditCommand::Undo),
                "y" if !is_mac => Some(EditCommand::Redo),
                _ => None,
            },
            Key::Character(c) if !mods.ctrl && !mods.meta => {
                Some(EditCommand::InsertText(c.to_string()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(combo: KeyCombo) -> Option<EditCommand> {
        EditCommand::from_key(&combo, false)
    }

    #[test]
    fn test_editing_keys() {
        assert_eq!(map(KeyCombo::new(Key::Enter)), Some(EditCommand::InsertNewline));
        assert_eq!(
            map(KeyCombo::shift(Key::Enter)),
            Some(EditCommand::InsertNewline)
        );
        assert_eq!(map(KeyCombo::new(Key::Tab)), Some(EditCommand::Indent));
        assert_eq!(map(KeyCombo::shift(Key::Tab)), Some(EditCommand::Outdent));
        assert_eq!(
            map(KeyCombo::new(Key::Backspace)),
            Some(EditCommand::DeleteBackward)
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            map(KeyCombo::shift(Key::ArrowLeft)),
            Some(EditCommand::Navigate {
                motion: Motion::Left,
                extend: true
            })
        );
        assert_eq!(
            map(KeyCombo::with_modifiers(Key::ArrowRight, Modifiers::ALT)),
            Some(EditCommand::Navigate {
                motion: Motion::WordRight,
                extend: false
            })
        );
        assert_eq!(
            map(KeyCombo::new(Key::Meta)),
            Some(EditCommand::Navigate {
                motion: Motion::Stay,
                extend: false
            })
        );
        assert_eq!(
            map(KeyCombo::primary(Key::ArrowDown, false)),
            Some(EditCommand::Navigate {
                motion: Motion::DocumentEnd,
                extend: false
            })
        );
    }

    #[test]
    fn test_primary_shortcuts_per_platform() {
        assert_eq!(
            EditCommand::from_key(&KeyCombo::primary(Key::character("a"), true), true),
            Some(EditCommand::SelectAll)
        );
        // Ctrl+A on mac is not select-all.
        assert_eq!(
            EditCommand::from_key(&KeyCombo::primary(Key::character("a"), false), true),
            None
        );
        assert_eq!(
            map(KeyCombo::primary(Key::character("x"), false)),
            Some(EditCommand::Cut)
        );
        assert_eq!(
            map(KeyCombo::with_modifiers(
                Key::character("Z"),
                Modifiers::CTRL.with_shift()
            )),
            Some(EditCommand::Redo)
        );
        assert_eq!(
            map(KeyCombo::primary(Key::character("z"), false)),
            Some(EditCommand::Undo)
        );
    }

    #[test]
    fn test_characters_insert_text() {
        assert_eq!(
            map(KeyCombo::new(Key::character("q"))),
            Some(EditCommand::InsertText("q".into()))
        );
        assert_eq!(
            map(KeyCombo::shift(Key::character("Q"))),
            Some(EditCommand::InsertText("Q".into()))
        );
        assert_eq!(map(KeyCombo::new(Key::Dead)), None);
        assert_eq!(map(KeyCombo::new(Key::Escape)), None);
    }

    #[test]
    fn test_mutating_commands() {
        assert!(EditCommand::InsertNewline.is_mutating());
        assert!(!EditCommand::SelectAll.is_mutating());
        assert!(
            !EditCommand::Navigate {
                motion: Motion::Up,
                extend: false
            }
            .is_mutating()
        );
    }
}
