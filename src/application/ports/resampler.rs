//! Sample-rate conversion port

use thiserror::Error;

/// Errors from the resampler adapter
#[derive(Debug, Clone, Error)]
pub enum ResampleError {
    #[error("failed to create resampler: {0}")]
    CreateFailed(String),

    #[error("resampling failed: {0}")]
    ProcessFailed(String),
}

/// Port converting one interleaved input frame to the codec operating rate.
///
/// Input and output sizes are fixed at construction; the adapter owns any
/// scratch buffers so the steady state allocates nothing.
pub trait SampleResampler: Send {
    /// Convert one full input frame. The returned slice holds exactly one
    /// output frame and is valid until the next call.
    fn process<'a>(&'a mut self, input: &'a [f32]) -> Result<&'a [f32], ResampleError>;
}
