//! # adagio-audio
//!
//! Gapless snippet playback for Adagio.
//!
//! Features:
//! - Symphonia decoding with conversion to the canonical PCM format
//! - An ordered snippet pipeline drained by a real-time callback
//! - Crossfade and fade-out edits spliced into queued material
//! - cpal output, plus a hand-driven output for offline rendering

pub mod buffer;
pub mod decode;
pub mod engine;
pub mod mix;
pub mod output;
pub mod pipeline;
pub mod resample;
pub mod store;

pub use buffer::AudioBuffer;
pub use engine::{PlaybackEngine, Renderer, StreamState};
pub use mix::MixEditor;
pub use output::{CpalOutput, ManualOutput, OutputDevice, OutputHandle, StreamSpec};
pub use pipeline::{Pipeline, PipelineEntry, PipelineSnapshot};
pub use store::SnippetStore;
