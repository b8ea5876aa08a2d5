//! Error types for adagio.

use thiserror::Error;

/// Result type alias using adagio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for adagio.
#[derive(Error, Debug)]
pub enum Error {
    // Snippet loading errors
    #[error("Snippet decode error: {0}")]
    Decode(String),

    #[error("Snippet format error: {0}")]
    Format(String),

    // Playback errors
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    #[error("Lookahead of {requested} exceeds the {available} queued snippets")]
    Lookahead { requested: usize, available: usize },

    #[error("Mix failed: {0}")]
    Mix(String),

    // Control loop errors
    #[error("No snippets selected: {0}")]
    Selection(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if the control loop can skip the failed attempt and carry on.
    ///
    /// Device failures and lifecycle misuse are the only errors that leave
    /// playback unusable.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Device(_) | Self::InvalidState(_))
    }

    /// Returns true if the error came from loading a snippet.
    pub const fn is_snippet_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Format(_))
    }
}
