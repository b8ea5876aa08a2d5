//! The ordered program of played, playing, and queued snippets.
//!
//! Entries before the cursor are history, the entry at the cursor is the one
//! being drained into the live segment, and entries after it are pending.
//! The cursor is always a valid index or exactly one past the end.

use crate::buffer::AudioBuffer;
use std::sync::Arc;
use tracing::trace;

/// One decoded snippet in the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineEntry {
    pub name: String,
    pub buffer: Arc<AudioBuffer>,
}

impl PipelineEntry {
    pub fn new(name: impl Into<String>, buffer: impl Into<Arc<AudioBuffer>>) -> Self {
        Self {
            name: name.into(),
            buffer: buffer.into(),
        }
    }
}

/// Names and cursor of a pipeline at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSnapshot {
    pub names: Vec<String>,
    pub cursor: usize,
}

impl PipelineSnapshot {
    /// The last name queued, if any.
    pub fn last_queued(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Names after the cursor.
    pub fn pending(&self) -> &[String] {
        self.names.get(self.cursor + 1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    entries: Vec<PipelineEntry>,
    cursor: usize,
    /// Played entries kept behind the cursor.
    retention: usize,
}

impl Pipeline {
    pub const fn new(retention: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries queued after the cursor.
    pub fn pending_len(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor + 1)
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    /// The entry at the cursor.
    pub fn current(&self) -> Option<&PipelineEntry> {
        self.entries.get(self.cursor)
    }

    /// Add entries at the tail, then drop history beyond the retention window.
    pub fn append<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = PipelineEntry>,
    {
        self.entries.extend(entries);
        self.trim_history();
    }

    /// Drop every entry more than `limit` positions after the cursor.
    ///
    /// Returns the number of entries removed.
    pub fn truncate_ahead(&mut self, limit: usize) -> usize {
        let keep = self.entries.len().min(self.cursor + 1 + limit);
        let dropped = self.entries.len() - keep;
        self.entries.truncate(keep);
        if dropped > 0 {
            trace!("Truncated {dropped} entries beyond cursor {}", self.cursor);
        }
        dropped
    }

    /// Move the cursor forward and return the newly current entry.
    ///
    /// Returns `None` with the cursor one past the end when nothing is left.
    pub fn advance(&mut self) -> Option<&PipelineEntry> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.entries.get(self.cursor)
    }

    /// Undo an [`advance`](Self::advance).
    pub fn retreat(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Name of the entry `distance` positions after the cursor.
    ///
    /// `peek_future(0)` is the current entry.
    pub fn peek_future(&self, distance: usize) -> Option<&str> {
        self.entries
            .get(self.cursor.checked_add(distance)?)
            .map(|entry| entry.name.as_str())
    }

    /// The last entry, if it lies after the cursor.
    pub fn pending_tail_mut(&mut self) -> Option<&mut PipelineEntry> {
        if self.pending_len() == 0 {
            return None;
        }
        self.entries.last_mut()
    }

    /// The entry at the cursor.
    pub fn current_mut(&mut self) -> Option<&mut PipelineEntry> {
        self.entries.get_mut(self.cursor)
    }

    /// The entry that finished playing most recently.
    pub fn last_played(&self) -> Option<&PipelineEntry> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            names: self.entries.iter().map(|e| e.name.clone()).collect(),
            cursor: self.cursor,
        }
    }

    fn trim_history(&mut self) {
        let excess = self.cursor.saturating_sub(self.retention);
        if excess > 0 {
            self.entries.drain(..excess);
            self.cursor -= excess;
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(16)
    }
}
