//! Sample rate conversion using rubato.

use adagio_core::{Error, Result};
use rubato::{FftFixedIn, Resampler as RubatoResampler};
use tracing::debug;

const CHUNK_SIZE: usize = 1024;

/// Whole-buffer resampler used when a snippet's rate differs from the canonical rate.
pub struct Resampler {
    #[allow(clippy::struct_field_names)]
    resampler: FftFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    /// Deinterleaved input waiting for a full chunk.
    input_buffer: Vec<Vec<f32>>,
}

impl Resampler {
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Result<Self> {
        let resampler = FftFixedIn::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_SIZE,
            2,
            channels,
        )
        .map_err(|e| Error::Format(format!("Failed to create resampler: {e}")))?;

        debug!(
            "Resampler created: {}Hz -> {}Hz, {} channels",
            input_rate, output_rate, channels
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels,
            input_buffer: vec![Vec::new(); channels],
        })
    }

    pub const fn needs_resampling(&self) -> bool {
        self.input_rate != self.output_rate
    }

    pub const fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub const fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Resample a complete interleaved buffer.
    ///
    /// The resampler's delay is trimmed and the result is exactly
    /// `ceil(frames * output_rate / input_rate)` frames long.
    pub fn resample_all(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if !self.needs_resampling() {
            return Ok(input.to_vec());
        }

        self.reset();

        let input_frames = input.len() / self.channels;
        let expected = (input_frames as u64 * u64::from(self.output_rate))
            .div_ceil(u64::from(self.input_rate)) as usize;
        let delay = self.resampler.output_delay();

        let mut output = self.process(input)?;

        // Push zeros through until the tail of the real signal has come out
        let padding = vec![0.0f32; CHUNK_SIZE * self.channels];
        while output.len() / self.channels < delay + expected {
            output.extend(self.process(&padding)?);
        }

        output.drain(..delay * self.channels);
        output.truncate(expected * self.channels);
        Ok(output)
    }

    /// Feed interleaved samples, returning whatever full chunks produced.
    fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.deinterleave(input);

        let mut all_output = Vec::new();

        while self.input_buffer[0].len() >= CHUNK_SIZE {
            let chunk: Vec<Vec<f32>> = self
                .input_buffer
                .iter_mut()
                .map(|ch| ch.drain(..CHUNK_SIZE).collect())
                .collect();

            let resampled = self
                .resampler
                .process(&chunk, None)
                .map_err(|e| Error::Format(format!("Resample failed: {e}")))?;

            all_output.extend(interleave(&resampled));
        }

        Ok(all_output)
    }

    /// Reset the resampler state.
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.input_buffer.iter_mut().for_each(Vec::clear);
    }

    fn deinterleave(&mut self, input: &[f32]) {
        for frame in input.chunks_exact(self.channels) {
            for (buffer, &sample) in self.input_buffer.iter_mut().zip(frame) {
                buffer.push(sample);
            }
        }
    }
}

/// Interleave planar channel buffers of equal length.
fn interleave(planes: &[Vec<f32>]) -> Vec<f32> {
    let frames = planes.first().map_or(0, Vec::len);
    (0..frames)
        .flat_map(|frame| planes.iter().map(move |plane| plane[frame]))
        .collect()
}
