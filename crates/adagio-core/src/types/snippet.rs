//! Snippet file naming.
//!
//! Snippets are cut from full pieces and named `<piece-title>.<ext>_<index>.wav`,
//! e.g. `Air on the G String.mp3_12.wav` is the twelfth snippet of
//! `Air on the G String.mp3`.

use serde::{Deserialize, Serialize};
use std::fmt;

const SNIPPET_EXTENSION: &str = ".wav";

/// Parsed snippet file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetName {
    /// File name of the piece the snippet was cut from.
    pub piece: String,
    /// 1-based position of the snippet within the piece.
    pub index: u32,
}

impl SnippetName {
    pub fn new(piece: impl Into<String>, index: u32) -> Self {
        Self {
            piece: piece.into(),
            index,
        }
    }

    /// Parse a snippet file name, returning `None` if it does not follow the convention.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(SNIPPET_EXTENSION)?;
        let (piece, index) = stem.rsplit_once('_')?;
        if piece.is_empty() {
            return None;
        }
        let index = index.parse().ok()?;
        Some(Self::new(piece, index))
    }

    /// Name of the snippet that follows this one in the same piece.
    pub fn next(&self) -> Self {
        Self::new(self.piece.clone(), self.index + 1)
    }

    /// The file name this snippet is stored under.
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SnippetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}{SNIPPET_EXTENSION}", self.piece, self.index)
    }
}
