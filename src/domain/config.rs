//! Recorder configuration

use serde::{Deserialize, Serialize};

use crate::domain::error::MimeParseError;
use crate::domain::mime::MimeDescriptor;

/// Options fixed for the lifetime of a recorder.
///
/// Loadable from TOML for the CLI; library callers usually build it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Requested container/codec pairing, e.g. `"audio/ogg;codecs=opus"`.
    /// The empty string selects the default container.
    pub mime_type: String,

    /// Target audio bitrate in bits per second; the codec default when unset
    pub bitrate: Option<u32>,

    /// Stop automatically after roughly this many milliseconds of recording
    pub auto_stop_ms: Option<u64>,
}

impl RecorderConfig {
    pub fn descriptor(&self) -> Result<MimeDescriptor, MimeParseError> {
        self.mime_type.parse()
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            mime_type: "audio/ogg".to_string(),
            bitrate: None,
            auto_stop_ms: None,
        }
    }
}
