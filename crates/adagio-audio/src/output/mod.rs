//! Pull-based audio outputs the engine can stream to.

pub mod hardware;
pub mod manual;

pub use hardware::{default_device_name, list_output_devices, CpalOutput};
pub use manual::ManualOutput;

use crate::engine::Renderer;
use adagio_core::{PcmFormat, Result};

/// What the engine asks an output to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub format: PcmFormat,
    /// Preferred callback size; outputs may deliver other sizes.
    pub frames_per_buffer: u32,
}

/// An audio output that pulls frames from a [`Renderer`] on its own clock.
pub trait OutputDevice {
    /// Start pulling from `renderer`.
    ///
    /// Fails with [`Error::Device`](adagio_core::Error::Device) when the output
    /// cannot be opened.
    fn open(&mut self, spec: StreamSpec, renderer: Renderer) -> Result<Box<dyn OutputHandle>>;
}

/// A running output stream.
pub trait OutputHandle: Send {
    /// Stop pulling. Returns once no callback is in flight.
    fn close(self: Box<Self>) -> Result<()>;
}
