//! Capture source port

use thiserror::Error;

use crate::application::worker::CaptureSink;

/// Errors from the audio capture adapter
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoDevice,

    #[error("failed to open capture stream: {0}")]
    OpenFailed(String),

    #[error("capture stream failed: {0}")]
    StreamFailed(String),

    #[error("unsupported device sample format: {0}")]
    UnsupportedFormat(String),
}

/// Native format the capture device delivers samples in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Port for a live audio source feeding the encoding context.
///
/// The source delivers `FrameChunk`s to the sink at whatever cadence the
/// device uses; the pipeline makes no assumption about chunk size. Errors
/// after `open` returns are reported asynchronously through the sink.
pub trait CaptureSource: Send {
    /// Open the device and begin delivering chunks to `sink`.
    fn open(&mut self, sink: CaptureSink) -> Result<CaptureFormat, CaptureError>;

    /// Stop delivering chunks but keep the device open.
    fn pause(&mut self);

    /// Resume delivering chunks after `pause`.
    fn resume(&mut self);

    /// Tear the stream down. Chunks already delivered stay delivered.
    fn close(&mut self);
}
