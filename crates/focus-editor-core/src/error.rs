//! Error types for editor operations.

use thiserror::Error;

/// Errors reported by a platform binding (selection API, caret placement).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlatformError {
    /// The platform selection referenced content that no longer exists,
    /// typically right after a structural mutation of the rendered blocks.
    #[error("stale selection: {0}")]
    StaleSelection(String),

    /// The rendering surface has not finished initializing.
    #[error("editor surface not ready")]
    NotReady,

    /// Anything else the platform reports.
    #[error("platform error: {0}")]
    Other(String),
}

impl PlatformError {
    /// Known-flaky failures that are recovered locally instead of propagated.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::StaleSelection(_) | PlatformError::NotReady)
    }
}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError::Other(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError::Other(s)
    }
}

/// Errors that can escape the editor engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EditorError {
    /// Unrecognized platform failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Writing rendered block HTML failed.
    #[error("render failed: {0}")]
    Render(#[from] std::fmt::Error),

    /// Rich paste content could not be converted to markdown.
    #[error("conversion failed: {0}")]
    Conversion(String),
}
