//! Port interfaces implemented by infrastructure adapters

pub mod capture;
pub mod codec;
pub mod muxer;
pub mod resampler;

pub use capture::{CaptureError, CaptureFormat, CaptureSource};
pub use codec::{CodecError, FrameCodec};
pub use muxer::{ContainerMuxer, MuxError};
pub use resampler::{ResampleError, SampleResampler};
