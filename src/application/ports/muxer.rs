//! Container muxer port

use thiserror::Error;

/// Errors from the container muxer adapter
#[derive(Debug, Clone, Error)]
pub enum MuxError {
    #[error("failed to create muxer: {0}")]
    CreateFailed(String),

    #[error("failed to write frame to container: {0}")]
    WriteFailed(String),

    #[error("failed to finish container stream: {0}")]
    CloseFailed(String),
}

/// Port framing codec packets into a byte stream.
///
/// Implementations buffer container bytes internally; `drain` hands out what
/// has been completed so far and may legitimately return nothing between
/// page boundaries.
pub trait ContainerMuxer: Send {
    /// Append one codec packet covering `samples_per_channel` samples at the
    /// codec operating rate.
    fn write_frame(&mut self, packet: &[u8], samples_per_channel: u32) -> Result<(), MuxError>;

    /// Take the container bytes completed since the previous drain.
    fn drain(&mut self) -> Vec<Vec<u8>>;

    /// Close the stream and return every remaining byte, including anything
    /// not yet drained. The muxer is unusable afterwards.
    fn finish(&mut self) -> Result<Vec<Vec<u8>>, MuxError>;
}
