//! Snippet fixtures written as WAV files into a temporary directory.

#![allow(dead_code, clippy::unwrap_used)]

use adagio_audio::{ManualOutput, PlaybackEngine, SnippetStore};
use adagio_core::{PcmFormat, PlayerConfig};
use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;
use tempfile::TempDir;

pub const RATE: u32 = 44_100;

/// Frames in `millis` at the canonical rate.
pub const fn frames(millis: u64) -> usize {
    PcmFormat::CD.frames_for_millis(millis)
}

/// A directory of generated snippets.
pub struct SnippetDir {
    dir: TempDir,
}

impl SnippetDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> SnippetStore {
        SnippetStore::new(self.path(), PcmFormat::CD)
    }

    /// Stereo snippet holding one sample value throughout.
    pub fn constant(&self, name: &str, millis: u64, value: i16) -> &Self {
        write_wav(&self.path().join(name), RATE, 2, frames(millis), |_| value);
        self
    }

    /// Stereo sine snippet at half amplitude.
    pub fn sine(&self, name: &str, millis: u64, frequency: f32) -> &Self {
        write_wav(&self.path().join(name), RATE, 2, frames(millis), |i| {
            let t = i as f32 / RATE as f32;
            (0.5 * (2.0 * PI * frequency * t).sin() * f32::from(i16::MAX)) as i16
        });
        self
    }

    /// A file with a `.wav` name that is not audio.
    pub fn garbage(&self, name: &str) -> &Self {
        std::fs::write(self.path().join(name), b"definitely not a RIFF header").unwrap();
        self
    }

    /// An engine reading from this directory, with a short initial silence.
    pub fn engine(&self) -> PlaybackEngine {
        let config = PlayerConfig {
            tick_ms: 100,
            ..PlayerConfig::with_snippet_dir(self.path())
        };
        PlaybackEngine::new(config)
    }

    /// An engine with an open stream on a hand-driven output.
    pub fn streaming(&self) -> (PlaybackEngine, ManualOutput) {
        let mut engine = self.engine();
        let output = ManualOutput::new();
        engine.open_stream(&mut output.clone()).unwrap();
        (engine, output)
    }
}

pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sample: impl Fn(usize) -> i16,
) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let value = sample(i);
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
}
