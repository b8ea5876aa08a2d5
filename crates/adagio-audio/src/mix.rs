//! Fade and crossfade edits on PCM buffers.
//!
//! Edits never touch the pipeline; the engine decides where their results go.
//! Every crossfade leaves an edge guard (100 ms by default) of untouched
//! material at the boundary, so very short buffers are spliced rather than
//! faded over zero frames.

use crate::buffer::AudioBuffer;
use adagio_core::{FadeCurve, PlayerConfig};
use std::borrow::Cow;
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

/// Produces faded and crossfaded buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixEditor {
    edge_guard: Duration,
    curve: FadeCurve,
}

impl MixEditor {
    pub const fn new(edge_guard: Duration, curve: FadeCurve) -> Self {
        Self { edge_guard, curve }
    }

    pub const fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.edge_guard(), config.fade_curve)
    }

    /// Crossfade length for a transition out of `frames` frames, never negative.
    pub fn crossfade_frames(&self, buffer: &AudioBuffer) -> usize {
        let guard = buffer.format().frames_for(self.edge_guard);
        buffer.frames().saturating_sub(guard)
    }

    /// `buffer` followed by an equal-length silence, crossfaded into it.
    pub fn fade_to_silence(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let silence = AudioBuffer::silence(buffer.format(), buffer.frames());
        let crossfade = self.crossfade_frames(buffer);
        append_with_crossfade(buffer, &silence, crossfade, self.curve)
    }

    /// `current` transitioning into `incoming`.
    ///
    /// When `current` is at least as long as `incoming` it is first trimmed to
    /// `incoming`'s length, so the transition always spans the shorter material.
    /// The result is `len(incoming) + min(len(trimmed current), edge guard)` long.
    pub fn crossfade_into(&self, current: &AudioBuffer, incoming: &AudioBuffer) -> AudioBuffer {
        let current = if current.frames() >= incoming.frames() {
            Cow::Owned(current.head(incoming.frames()))
        } else {
            Cow::Borrowed(current)
        };
        let crossfade = self.crossfade_frames(&current);
        append_with_crossfade(&current, incoming, crossfade, self.curve)
    }
}

impl Default for MixEditor {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), FadeCurve::EqualPower)
    }
}

/// Gains `(outgoing, incoming)` at normalised position `t` through a crossfade.
pub fn fade_gains(curve: FadeCurve, t: f32) -> (f32, f32) {
    let t = t.clamp(0.0, 1.0);
    match curve {
        FadeCurve::EqualPower => ((t * FRAC_PI_2).cos(), (t * FRAC_PI_2).sin()),
        FadeCurve::Linear => (1.0 - t, t),
    }
}

/// Join `b` onto `a`, overlapping the last `crossfade` frames of `a` with the
/// first `crossfade` frames of `b`.
///
/// The overlap is clamped to the shorter buffer. The result is
/// `len(a) + len(b) - crossfade` frames long.
pub fn append_with_crossfade(
    a: &AudioBuffer,
    b: &AudioBuffer,
    crossfade: usize,
    curve: FadeCurve,
) -> AudioBuffer {
    debug_assert_eq!(a.format(), b.format(), "mixed PCM formats");

    let channels = a.channels().max(1);
    let crossfade = crossfade.min(a.frames()).min(b.frames());
    let head = a.frames() - crossfade;

    let outgoing = a.frame_slice(head..a.frames());
    let incoming = b.frame_slice(0..crossfade);
    let mut overlap = Vec::with_capacity(crossfade * channels);
    for (i, (fa, fb)) in outgoing
        .chunks_exact(channels)
        .zip(incoming.chunks_exact(channels))
        .enumerate()
    {
        let t = (i as f32 + 0.5) / crossfade as f32;
        let (gain_out, gain_in) = fade_gains(curve, t);
        for (&sa, &sb) in fa.iter().zip(fb) {
            let mixed = f32::from(sa).mul_add(gain_out, f32::from(sb) * gain_in);
            overlap.push(mixed.round().clamp(-32_768.0, 32_767.0) as i16);
        }
    }

    let mut joined = a.head(head);
    joined.append(&AudioBuffer::from_samples(a.format(), overlap));
    joined.append(&b.tail_from(crossfade));
    joined
}
