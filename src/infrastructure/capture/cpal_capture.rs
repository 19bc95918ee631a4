//! Default-input-device capture via cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread for its
//! whole life. Pause and resume just gate the data callback with an atomic
//! flag; the device keeps running so resume is glitch-free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SizedSample};

use crate::application::ports::{CaptureError, CaptureFormat, CaptureSource};
use crate::application::worker::{CaptureFailureHandle, CaptureSink};
use crate::domain::recording::FrameChunk;

/// Opus takes mono or stereo; wider devices contribute their first two channels
const MAX_CHANNELS: u16 = 2;

pub struct CpalCaptureSource {
    attached: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCaptureSource {
    pub fn new() -> Self {
        Self {
            attached: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl Default for CpalCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for CpalCaptureSource {
    fn open(&mut self, sink: CaptureSink) -> Result<CaptureFormat, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;
        let device_config = device
            .default_input_config()
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        let sample_rate = device_config.sample_rate().0;
        let device_channels = device_config.channels().max(1);
        let channels = device_channels.min(MAX_CHANNELS);
        let sample_format = device_config.sample_format();
        let stream_config: cpal::StreamConfig = device_config.into();

        log::debug!(
            "input device {:?}: {:?}, {} Hz, {} ch",
            device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            sample_format,
            sample_rate,
            device_channels
        );

        self.shutdown.store(false, Ordering::SeqCst);
        self.attached.store(true, Ordering::SeqCst);
        let attached = Arc::clone(&self.attached);
        let shutdown = Arc::clone(&self.shutdown);
        let failure = sink.failure_handle();

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let built = match sample_format {
                    cpal::SampleFormat::F32 => build_stream::<f32>(
                        &device, &stream_config, device_channels, channels, sample_rate,
                        attached, sink, failure.clone(),
                    ),
                    cpal::SampleFormat::I16 => build_stream::<i16>(
                        &device, &stream_config, device_channels, channels, sample_rate,
                        attached, sink, failure.clone(),
                    ),
                    cpal::SampleFormat::U16 => build_stream::<u16>(
                        &device, &stream_config, device_channels, channels, sample_rate,
                        attached, sink, failure.clone(),
                    ),
                    cpal::SampleFormat::I32 => build_stream::<i32>(
                        &device, &stream_config, device_channels, channels, sample_rate,
                        attached, sink, failure.clone(),
                    ),
                    other => Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
                };
                match built {
                    Ok(stream) => {
                        if let Err(e) = stream.play() {
                            failure.report(CaptureError::OpenFailed(e.to_string()));
                            return;
                        }
                        while !shutdown.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(20));
                        }
                        drop(stream);
                    }
                    Err(e) => failure.report(e),
                }
            })
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;
        self.thread = Some(handle);

        Ok(CaptureFormat {
            sample_rate,
            channels,
        })
    }

    fn pause(&mut self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) {
        self.attached.store(false, Ordering::SeqCst);
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CpalCaptureSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[allow(clippy::too_many_arguments)]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    device_channels: u16,
    out_channels: u16,
    sample_rate: u32,
    attached: Arc<AtomicBool>,
    mut sink: CaptureSink,
    failure: CaptureFailureHandle,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample + Sample + Send + 'static,
    <T as Sample>::Float: Into<f32>,
{
    let data_callback = move |data: &[T], _: &cpal::InputCallbackInfo| {
        if !attached.load(Ordering::SeqCst) {
            return;
        }
        let channels = deinterleave(data, device_channels as usize, out_channels as usize);
        match FrameChunk::new(channels, sample_rate) {
            Ok(chunk) => sink.push(chunk),
            Err(e) => log::warn!("dropping malformed capture buffer: {}", e),
        }
    };
    let error_callback = move |err: cpal::StreamError| {
        failure.report(CaptureError::StreamFailed(err.to_string()));
    };
    device
        .build_input_stream(config, data_callback, error_callback, None)
        .map_err(|e| CaptureError::OpenFailed(e.to_string()))
}

/// Split a device buffer into per-channel float buffers, keeping only the
/// first `out_channels` channels.
fn deinterleave<T>(data: &[T], device_channels: usize, out_channels: usize) -> Vec<Vec<f32>>
where
    T: SizedSample + Sample,
    <T as Sample>::Float: Into<f32>,
{
    let frames = data.len() / device_channels;
    let mut channels: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); out_channels];
    for frame in 0..frames {
        for (ch, buffer) in channels.iter_mut().enumerate() {
            let sample = data[frame * device_channels + ch];
            buffer.push(sample.to_float_sample().into());
        }
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleave_splits_stereo() {
        let data = [0.1_f32, -0.1, 0.2, -0.2, 0.3, -0.3];
        let channels = deinterleave(&data, 2, 2);
        assert_eq!(channels[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(channels[1], vec![-0.1, -0.2, -0.3]);
    }

    #[test]
    fn deinterleave_drops_extra_channels() {
        let data = [1.0_f32, 2.0, 9.0, 1.5, 2.5, 9.5];
        let channels = deinterleave(&data, 3, 2);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0], vec![1.0, 1.5]);
        assert_eq!(channels[1], vec![2.0, 2.5]);
    }

    #[test]
    fn deinterleave_converts_integer_samples() {
        let data = [0_i16, i16::MAX, i16::MIN, 0];
        let channels = deinterleave(&data, 2, 2);
        assert!((channels[0][0] - 0.0).abs() < 1e-4);
        assert!((channels[0][1] - -1.0).abs() < 1e-4);
        assert!((channels[1][0] - 1.0).abs() < 1e-3);
    }
}
