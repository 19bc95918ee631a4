//! Opus codec adapter

use crate::application::ports::{CodecError, FrameCodec};

/// Opus always operates at 48 kHz; capture audio is resampled to match.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// Recommended maximum size of one Opus packet
const MAX_PACKET_SIZE: usize = 4000;

/// Stateful Opus encoder consuming 20 ms interleaved float frames
pub struct OpusFrameCodec {
    encoder: opus::Encoder,
    packet: Vec<u8>,
}

impl OpusFrameCodec {
    pub fn new(channels: u16, bitrate: Option<u32>) -> Result<Self, CodecError> {
        let opus_channels = match channels {
            1 => opus::Channels::Mono,
            2 => opus::Channels::Stereo,
            other => return Err(CodecError::UnsupportedChannels(other)),
        };
        let mut encoder =
            opus::Encoder::new(OPUS_SAMPLE_RATE, opus_channels, opus::Application::Audio)
                .map_err(|e| CodecError::CreateFailed(e.to_string()))?;
        if let Some(bits) = bitrate {
            encoder
                .set_bitrate(opus::Bitrate::Bits(bits as i32))
                .map_err(|e| CodecError::CreateFailed(e.to_string()))?;
        }
        Ok(Self {
            encoder,
            packet: vec![0u8; MAX_PACKET_SIZE],
        })
    }
}

impl FrameCodec for OpusFrameCodec {
    fn encode<'a>(&'a mut self, frame: &[f32]) -> Result<&'a [u8], CodecError> {
        let written = self
            .encoder
            .encode_float(frame, &mut self.packet)
            .map_err(|e| CodecError::EncodeFailed(e.to_string()))?;
        Ok(&self.packet[..written])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: usize = 960; // 20 ms at 48 kHz

    #[test]
    fn encodes_a_stereo_frame() {
        let mut codec = OpusFrameCodec::new(2, None).unwrap();
        let frame: Vec<f32> = (0..FRAME * 2)
            .map(|i| (i as f32 * 0.01).sin() * 0.4)
            .collect();
        let packet = codec.encode(&frame).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() <= MAX_PACKET_SIZE);
    }

    #[test]
    fn encodes_mono_silence_compactly() {
        let mut codec = OpusFrameCodec::new(1, None).unwrap();
        let frame = vec![0.0_f32; FRAME];
        let packet = codec.encode(&frame).unwrap();
        // Silence compresses to a handful of bytes
        assert!(packet.len() < 32);
    }

    #[test]
    fn honors_configured_bitrate() {
        assert!(OpusFrameCodec::new(2, Some(96_000)).is_ok());
    }

    #[test]
    fn rejects_more_than_two_channels() {
        assert!(matches!(
            OpusFrameCodec::new(6, None),
            Err(CodecError::UnsupportedChannels(6))
        ));
    }

    #[test]
    fn rejects_wrong_frame_size() {
        let mut codec = OpusFrameCodec::new(1, None).unwrap();
        assert!(codec.encode(&[0.0; 961]).is_err());
    }
}
