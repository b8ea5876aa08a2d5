//! Audio output using cpal.

use super::{OutputDevice, OutputHandle, StreamSpec};
use crate::engine::Renderer;
use adagio_core::{Error, Result};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize,
};
use crossbeam_channel::{bounded, Sender};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Output to a cpal device.
///
/// `cpal::Stream` is not `Send`, so the stream is built, owned, and dropped
/// on a dedicated thread for its whole life.
#[derive(Debug, Clone, Default)]
pub struct CpalOutput {
    /// Output device to use; the host default when `None`.
    device_name: Option<String>,
}

impl CpalOutput {
    /// Output to the default device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output to the device called `name`.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn find_device(&self) -> Result<Device> {
        let host = cpal::default_host();

        match &self.device_name {
            None => host
                .default_output_device()
                .ok_or_else(|| Error::Device("No output device found".to_string())),
            Some(wanted) => host
                .output_devices()
                .map_err(|e| Error::Device(format!("Failed to list devices: {e}")))?
                .find(|d| d.name().is_ok_and(|name| &name == wanted))
                .ok_or_else(|| Error::Device(format!("Output device '{wanted}' not found"))),
        }
    }

    fn start_stream(&self, spec: StreamSpec, renderer: Renderer) -> Result<(Stream, String)> {
        let device = self.find_device()?;
        start_on_device(&device, spec, renderer)
    }
}

impl OutputDevice for CpalOutput {
    fn open(&mut self, spec: StreamSpec, renderer: Renderer) -> Result<Box<dyn OutputHandle>> {
        let output = self.clone();
        let (ready_tx, ready_rx) = bounded::<Result<String>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match output.start_stream(spec, renderer) {
                Ok((stream, device_name)) => {
                    let _ = ready_tx.send(Ok(device_name));
                    // Park until closed; a dropped sender also ends the stream
                    let _ = stop_rx.recv();
                    drop(stream);
                    debug!("Output stream dropped");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| Error::Device(format!("Failed to spawn output thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(device_name)) => {
                info!(
                    "Audio output started on {device_name}: {} Hz, {} channels",
                    spec.format.sample_rate, spec.format.channels
                );
                Ok(Box::new(CpalHandle {
                    stop_tx: Some(stop_tx),
                    thread: Some(thread),
                }))
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Device("Output thread exited during start".to_string()))
            }
        }
    }
}

/// Handle to a stream running on its output thread.
struct CpalHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalHandle {
    fn shutdown(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| Error::Device("Output thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl OutputHandle for CpalHandle {
    fn close(mut self: Box<Self>) -> Result<()> {
        self.shutdown()
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Output shutdown failed: {e}");
        }
    }
}

fn start_on_device(device: &Device, spec: StreamSpec, renderer: Renderer) -> Result<(Stream, String)> {
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let (config, sample_format) = select_config(device, spec)?;

    debug!(
        "Output config for {device_name}: {:?}, {:?}",
        config, sample_format
    );

    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(device, &config, renderer)?,
        SampleFormat::F32 => build_stream::<f32>(device, &config, renderer)?,
        SampleFormat::U16 => build_stream::<u16>(device, &config, renderer)?,
        _ => {
            return Err(Error::Device(format!(
                "Unsupported sample format: {sample_format:?}"
            )));
        }
    };

    stream
        .play()
        .map_err(|e| Error::Device(format!("Failed to start stream: {e}")))?;

    Ok((stream, device_name))
}

/// Find a device config matching the canonical rate and channel count.
///
/// Native i16 is preferred so samples pass through untouched.
fn select_config(device: &Device, spec: StreamSpec) -> Result<(StreamConfig, SampleFormat)> {
    let rate = SampleRate(spec.format.sample_rate);

    let mut candidates: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| Error::Device(format!("Failed to query output configs: {e}")))?
        .filter(|range| {
            range.channels() == spec.format.channels
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .collect();

    candidates.sort_by_key(|range| match range.sample_format() {
        SampleFormat::I16 => 0,
        SampleFormat::F32 => 1,
        _ => 2,
    });

    let supported = candidates
        .into_iter()
        .next()
        .ok_or_else(|| {
            Error::Device(format!(
                "Device does not support {} Hz with {} channels",
                spec.format.sample_rate, spec.format.channels
            ))
        })?
        .with_sample_rate(rate);

    let sample_format = supported.sample_format();
    let buffer_size = match supported.buffer_size() {
        SupportedBufferSize::Range { min, max } => {
            BufferSize::Fixed(spec.frames_per_buffer.clamp(*min, *max))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    };

    let mut config = supported.config();
    config.buffer_size = buffer_size;
    Ok((config, sample_format))
}

fn build_stream<T>(device: &Device, config: &StreamConfig, renderer: Renderer) -> Result<Stream>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let err_fn = |err| {
        error!("Audio stream error: {err}");
    };

    let initial = match config.buffer_size {
        BufferSize::Fixed(frames) => frames as usize * usize::from(config.channels),
        BufferSize::Default => 0,
    };
    let mut scratch = vec![0i16; initial];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Grows only if the host delivers a larger buffer than requested
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0);
                }
                let pcm = &mut scratch[..data.len()];
                renderer.render(pcm);
                for (sample, &value) in data.iter_mut().zip(pcm.iter()) {
                    *sample = T::from_sample(value);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| Error::Device(format!("Failed to build stream: {e}")))
}

/// List available output devices.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();

    let devices: Vec<String> = host
        .output_devices()
        .map_err(|e| Error::Device(format!("Failed to list devices: {e}")))?
        .filter_map(|d| d.name().ok())
        .collect();

    Ok(devices)
}

/// Get the default output device name.
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}
