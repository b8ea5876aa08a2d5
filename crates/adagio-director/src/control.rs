//! The playback operations the director relies on.

use adagio_audio::{PipelineSnapshot, PlaybackEngine};
use adagio_core::Result;

/// Control-thread view of a player.
pub trait PlaybackControl {
    /// Queue `names` at the tail of the program, returning how many were queued.
    fn write_to_pipeline(&self, names: &[String]) -> Result<usize>;

    /// Crossfade from the current program into `names[location]` and queue the rest.
    fn fade_and_mix(&self, names: &[String], location: usize) -> Result<()>;

    /// Fade the program out to silence.
    fn fade_and_stop_playback(&self);

    fn is_silent(&self) -> bool;

    /// Name of the snippet `distance` entries after the one playing now.
    fn get_future_snippet(&self, distance: usize) -> Result<String>;

    fn pipeline_snapshot(&self) -> PipelineSnapshot;
}

impl PlaybackControl for PlaybackEngine {
    fn write_to_pipeline(&self, names: &[String]) -> Result<usize> {
        Self::write_to_pipeline(self, names)
    }

    fn fade_and_mix(&self, names: &[String], location: usize) -> Result<()> {
        Self::fade_and_mix(self, names, location)
    }

    fn fade_and_stop_playback(&self) {
        Self::fade_and_stop_playback(self);
    }

    fn is_silent(&self) -> bool {
        Self::is_silent(self)
    }

    fn get_future_snippet(&self, distance: usize) -> Result<String> {
        Self::get_future_snippet(self, distance)
    }

    fn pipeline_snapshot(&self) -> PipelineSnapshot {
        Self::pipeline_snapshot(self)
    }
}
