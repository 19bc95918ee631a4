//! Recording domain types

pub mod chunk;
pub mod duration;
pub mod session;

pub use chunk::{EncodedChunk, FrameChunk};
pub use duration::Duration;
pub use session::{RecorderState, RecordingSession};
