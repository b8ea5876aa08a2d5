//! Core domain types for adagio.

pub mod format;
pub mod game;
pub mod snippet;

pub use format::PcmFormat;
pub use game::{GameState, Mood};
pub use snippet::SnippetName;
