//! Linear PCM "codec" for the WAV backend
//!
//! Converts interleaved `f32` frames to signed 16-bit little-endian bytes.
//! No compression; the output buffer is sized once at construction.

use crate::application::ports::{CodecError, FrameCodec};

pub struct PcmFrameCodec {
    bytes: Vec<u8>,
}

impl PcmFrameCodec {
    pub fn new(channels: u16, samples_per_channel: usize) -> Self {
        Self {
            bytes: vec![0u8; samples_per_channel * channels as usize * 2],
        }
    }
}

impl FrameCodec for PcmFrameCodec {
    fn encode<'a>(&'a mut self, frame: &[f32]) -> Result<&'a [u8], CodecError> {
        let needed = frame.len() * 2;
        if needed > self.bytes.len() {
            return Err(CodecError::EncodeFailed(format!(
                "frame of {} samples exceeds configured size",
                frame.len()
            )));
        }
        for (i, &sample) in frame.iter().enumerate() {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            self.bytes[i * 2..i * 2 + 2].copy_from_slice(&value.to_le_bytes());
        }
        Ok(&self.bytes[..needed])
    }
}
