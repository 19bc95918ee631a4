//! Infrastructure layer - adapter implementations of the ports

pub mod backend;
pub mod capture;
pub mod codec;
pub mod muxer;
pub mod resampler;

use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::application::recorder::{Recorder, RecorderError, RecorderEvent};
use crate::domain::config::RecorderConfig;

/// Build a recorder wired to the default input device and the standard
/// container backends.
pub fn default_recorder(
    config: RecorderConfig,
) -> Result<(Recorder, Receiver<RecorderEvent>), RecorderError> {
    Recorder::new(
        Box::new(capture::CpalCaptureSource::new()),
        Arc::new(backend::StandardEncoderFactory),
        config,
    )
}
