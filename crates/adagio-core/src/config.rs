//! Player configuration.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use crate::{PcmFormat, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Shape of the gain curves used when two buffers overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// `sin`/`cos` quarter waves, constant perceived loudness.
    #[default]
    EqualPower,
    /// Straight gain ramps.
    Linear,
}

/// Settings for the snippet store, pipeline, and playback engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Directory snippet names are resolved against.
    pub snippet_dir: PathBuf,
    /// Format every snippet is converted to before it reaches the callback.
    pub format: PcmFormat,
    /// Length of the silence segment, one detection tick.
    pub tick_ms: u64,
    /// Buffer size requested from the output device.
    pub frames_per_buffer: u32,
    /// Snippets kept ahead of the cursor when a fade or mix edit is made.
    pub lookahead_window: usize,
    /// Played snippets kept behind the cursor.
    pub history_retention: usize,
    /// Material at a fade boundary that is never crossfaded.
    pub edge_guard_ms: u64,
    pub fade_curve: FadeCurve,
    /// How long the audio callback waits for the pipeline lock before emitting silence.
    pub callback_lock_timeout_us: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            snippet_dir: default_snippet_dir(),
            format: PcmFormat::CD,
            tick_ms: 1000,
            frames_per_buffer: 22_050,
            lookahead_window: 4,
            history_retention: 16,
            edge_guard_ms: 100,
            fade_curve: FadeCurve::EqualPower,
            callback_lock_timeout_us: 2_000,
        }
    }
}

impl PlayerConfig {
    /// Default configuration reading snippets from `snippet_dir`.
    pub fn with_snippet_dir(snippet_dir: impl Into<PathBuf>) -> Self {
        Self {
            snippet_dir: snippet_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub const fn edge_guard(&self) -> Duration {
        Duration::from_millis(self.edge_guard_ms)
    }

    pub const fn callback_lock_timeout(&self) -> Duration {
        Duration::from_micros(self.callback_lock_timeout_us)
    }

    /// Frames in one silence segment.
    pub const fn tick_frames(&self) -> usize {
        self.format.frames_for_millis(self.tick_ms)
    }
}

/// Per-user data directory for snippets, falling back to `./snippets`.
fn default_snippet_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "adagio")
        .map(|d| d.data_dir().join("snippets"))
        .unwrap_or_else(|| PathBuf::from("snippets"))
}
