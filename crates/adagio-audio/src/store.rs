//! Loading named snippets into canonical-format buffers.

use crate::buffer::AudioBuffer;
use crate::decode::{decode_file, DecodedAudio};
use crate::resample::Resampler;
use adagio_core::{Error, PcmFormat, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves snippet names under a directory and decodes them to the canonical format.
#[derive(Debug, Clone)]
pub struct SnippetStore {
    root: PathBuf,
    format: PcmFormat,
}

impl SnippetStore {
    pub fn new(root: impl Into<PathBuf>, format: PcmFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn format(&self) -> PcmFormat {
        self.format
    }

    /// Path a snippet name resolves to.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Decode `name` and convert it to the store's format.
    ///
    /// Missing or unreadable files fail with [`Error::Decode`]; files that decode
    /// to no audio at all fail with [`Error::Format`].
    pub fn load(&self, name: &str) -> Result<AudioBuffer> {
        let path = self.path_of(name);
        let decoded = decode_file(&path)?;
        if decoded.frames() == 0 {
            return Err(Error::Format(format!("{name} contains no audio")));
        }

        let buffer = self.conform(decoded)?;
        if buffer.is_empty() {
            return Err(Error::Format(format!("{name} converted to no audio")));
        }

        debug!(
            "Loaded snippet {name}: {} frames ({:.2}s)",
            buffer.frames(),
            buffer.duration().as_secs_f64()
        );
        Ok(buffer)
    }

    /// Convert decoded audio to the store's channel layout, rate, and bit depth.
    pub fn conform(&self, decoded: DecodedAudio) -> Result<AudioBuffer> {
        let channels = usize::from(self.format.channels);
        let mapped = remap_channels(&decoded.samples, usize::from(decoded.channels), channels);

        let resampled = if decoded.sample_rate == self.format.sample_rate {
            mapped
        } else {
            Resampler::new(decoded.sample_rate, self.format.sample_rate, channels)?
                .resample_all(&mapped)?
        };

        let samples = resampled.into_iter().map(quantize).collect();
        Ok(AudioBuffer::from_samples(self.format, samples))
    }
}

/// Map interleaved audio from `from` channels to `to` channels.
///
/// Mono is duplicated across every output channel; extra source channels are dropped.
fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut output = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        for ch in 0..to {
            output.push(if from == 1 { frame[0] } else { frame[ch.min(from - 1)] });
        }
    }
    output
}

/// f32 in `[-1.0, 1.0]` to i16 with clamping.
fn quantize(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(-32_768.0, 32_767.0) as i16
}
