//! Frame codec port

use thiserror::Error;

/// Errors from the frame codec adapter
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("failed to create encoder: {0}")]
    CreateFailed(String),

    #[error("encoding failed: {0}")]
    EncodeFailed(String),

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u16),
}

/// Port for a stateful compressor consuming fixed-size interleaved frames.
///
/// One encoder handle per encoding context; the handle is released by drop
/// when the context closes or aborts.
pub trait FrameCodec: Send {
    /// Compress exactly one frame of interleaved samples at the codec
    /// operating rate, returning the packet bytes. The returned slice is
    /// valid until the next call.
    fn encode<'a>(&'a mut self, frame: &[f32]) -> Result<&'a [u8], CodecError>;
}
