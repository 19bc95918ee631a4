//! opus-recorder - MediaRecorder-style audio recording pipeline
//!
//! Captures multichannel audio, resamples it to the codec operating rate,
//! compresses it with Opus (or passes linear PCM through), and frames the
//! packets into a streamable container, exposing a record/pause/resume/stop
//! lifecycle to the caller.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: lifecycle state machine, MIME descriptors, sample chunks, errors
//! - **Application**: port interfaces, the encoding pipeline, the encoder
//!   message protocol, and the recorder front-end
//! - **Infrastructure**: adapters (cpal, opus, rubato, ogg, hound)
//! - **CLI**: command-line recording tool
//!
//! The recorder front-end and the encoding pipeline run on separate threads
//! and share no sample memory; raw buffers move across an ordered channel.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export the public surface
pub use application::recorder::{Recorder, RecorderError, RecorderEvent};
pub use domain::config::RecorderConfig;
pub use domain::mime::{is_type_supported, ContainerFormat, MimeDescriptor};
pub use domain::recording::{EncodedChunk, FrameChunk, RecorderState};
