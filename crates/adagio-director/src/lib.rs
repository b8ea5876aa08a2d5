//! # adagio-director
//!
//! Turns a stream of detected game states into playback decisions.
//!
//! Each tick the [`Director`] asks a [`MoodResolver`] what the new state
//! means for the music, asks a [`SnippetSelector`] which snippets to use, and
//! drives anything implementing [`PlaybackControl`] (normally the
//! [`PlaybackEngine`](adagio_audio::PlaybackEngine)).

pub mod catalog;
pub mod control;
pub mod director;
pub mod mood;

pub use catalog::{CatalogSelector, SnippetCatalog, SnippetSelector};
pub use control::PlaybackControl;
pub use director::{Director, DirectorConfig, TickOutcome};
pub use mood::{MoodDecision, MoodResolver, StaticMoodMap};
