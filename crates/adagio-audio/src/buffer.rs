//! Owned PCM buffers in the engine's canonical format.

use adagio_core::PcmFormat;
use std::ops::Range;
use std::time::Duration;

/// A contiguous run of interleaved 16-bit PCM frames.
///
/// Every buffer that reaches the audio callback is already in the engine's
/// canonical format; nothing is converted on the real-time path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    format: PcmFormat,
    samples: Vec<i16>,
}

impl AudioBuffer {
    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn from_samples(format: PcmFormat, mut samples: Vec<i16>) -> Self {
        let channels = usize::from(format.channels.max(1));
        let whole = samples.len() - samples.len() % channels;
        samples.truncate(whole);
        Self { format, samples }
    }

    /// `frames` frames of digital silence.
    pub fn silence(format: PcmFormat, frames: usize) -> Self {
        Self {
            format,
            samples: vec![0; format.samples_for_frames(frames)],
        }
    }

    pub const fn format(&self) -> PcmFormat {
        self.format
    }

    pub const fn channels(&self) -> usize {
        self.format.channels as usize
    }

    /// Length in frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels().max(1)
    }

    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.frames())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Borrow the samples of a frame range, clamped to the buffer.
    pub fn frame_slice(&self, frames: Range<usize>) -> &[i16] {
        let end = frames.end.min(self.frames());
        let start = frames.start.min(end);
        &self.samples[start * self.channels()..end * self.channels()]
    }

    /// Copy a frame range into a new buffer, clamped to the buffer.
    pub fn slice(&self, frames: Range<usize>) -> Self {
        Self {
            format: self.format,
            samples: self.frame_slice(frames).to_vec(),
        }
    }

    /// The first `frames` frames.
    pub fn head(&self, frames: usize) -> Self {
        self.slice(0..frames)
    }

    /// Everything from frame `start` on.
    pub fn tail_from(&self, start: usize) -> Self {
        self.slice(start..self.frames())
    }

    /// Add the frames of `other` to the end of this buffer.
    pub fn append(&mut self, other: &Self) {
        debug_assert_eq!(self.format, other.format, "appending mismatched PCM formats");
        self.samples.extend_from_slice(&other.samples);
    }

    /// True when every sample is zero.
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}
