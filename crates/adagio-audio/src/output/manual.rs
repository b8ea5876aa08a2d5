//! An output whose callbacks are driven by hand.
//!
//! Useful for offline rendering and for exercising the engine without audio hardware.

use super::{OutputDevice, OutputHandle, StreamSpec};
use crate::engine::Renderer;
use adagio_core::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Output that renders only when [`pull`](ManualOutput::pull) is called.
///
/// Clones share the same stream, so one clone can be handed to the engine
/// while another drives it.
#[derive(Clone, Default)]
pub struct ManualOutput {
    stream: Arc<Mutex<Option<(StreamSpec, Renderer)>>>,
}

impl ManualOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the engine currently has a stream open on this output.
    pub fn is_open(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// Run one callback for `frames` frames, or `None` if no stream is open.
    pub fn pull(&self, frames: usize) -> Option<Vec<i16>> {
        let stream = self.stream.lock();
        let (spec, renderer) = stream.as_ref()?;
        let mut out = vec![0i16; spec.format.samples_for_frames(frames)];
        renderer.render(&mut out);
        Some(out)
    }

    /// Run callbacks of `frames_per_call` frames until `total_frames` have been rendered.
    pub fn pull_frames(&self, total_frames: usize, frames_per_call: usize) -> Option<Vec<i16>> {
        let mut rendered = Vec::new();
        let mut remaining = total_frames;
        while remaining > 0 {
            let frames = remaining.min(frames_per_call.max(1));
            rendered.extend(self.pull(frames)?);
            remaining -= frames;
        }
        Some(rendered)
    }
}

impl OutputDevice for ManualOutput {
    fn open(&mut self, spec: StreamSpec, renderer: Renderer) -> Result<Box<dyn OutputHandle>> {
        *self.stream.lock() = Some((spec, renderer));
        Ok(Box::new(ManualHandle {
            stream: Arc::clone(&self.stream),
        }))
    }
}

struct ManualHandle {
    stream: Arc<Mutex<Option<(StreamSpec, Renderer)>>>,
}

impl OutputHandle for ManualHandle {
    fn close(self: Box<Self>) -> Result<()> {
        // Taking the lock waits out any pull in progress
        self.stream.lock().take();
        Ok(())
    }
}
