//! PCM format description.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interleaved signed 16-bit PCM layout.
///
/// The bit depth is fixed; only the rate and channel count vary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Samples per frame.
    pub channels: u16,
}

impl PcmFormat {
    /// 44.1 kHz stereo, the format every snippet is normalised to.
    pub const CD: Self = Self {
        sample_rate: 44_100,
        channels: 2,
    };

    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Bytes per interleaved sample.
    pub const fn sample_width(&self) -> usize {
        2
    }

    /// Number of whole frames covering `millis` milliseconds.
    pub const fn frames_for_millis(&self, millis: u64) -> usize {
        (millis * self.sample_rate as u64 / 1000) as usize
    }

    /// Number of whole frames covering `duration`.
    pub fn frames_for(&self, duration: Duration) -> usize {
        (duration.as_micros() * u128::from(self.sample_rate) / 1_000_000) as usize
    }

    /// Duration of `frames` frames.
    pub fn duration_of(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Number of interleaved samples in `frames` frames.
    pub const fn samples_for_frames(&self, frames: usize) -> usize {
        frames * self.channels as usize
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::CD
    }
}
