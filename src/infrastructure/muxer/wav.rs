//! WAV container muxer
//!
//! Frames s16le PCM packets with `hound`. RIFF headers carry total sizes that
//! are back-patched at finalize, so nothing can be streamed incrementally;
//! `drain` stays empty and the whole file arrives from `finish`.

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::application::ports::{ContainerMuxer, MuxError};
use crate::infrastructure::muxer::sink::SharedCursor;

pub struct WavMuxer {
    writer: Option<WavWriter<SharedCursor>>,
    bytes: SharedCursor,
}

impl WavMuxer {
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, MuxError> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = SharedCursor::new();
        let writer = WavWriter::new(bytes.clone(), spec)
            .map_err(|e| MuxError::CreateFailed(e.to_string()))?;
        Ok(Self {
            writer: Some(writer),
            bytes,
        })
    }
}

impl ContainerMuxer for WavMuxer {
    fn write_frame(&mut self, packet: &[u8], _samples_per_channel: u32) -> Result<(), MuxError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MuxError::WriteFailed("stream already finished".to_string()))?;
        for pair in packet.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| MuxError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>, MuxError> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| MuxError::CloseFailed(e.to_string()))?;
        }
        Ok(vec![self.bytes.take()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn drain_never_streams() {
        let mut muxer = WavMuxer::new(48_000, 1).unwrap();
        muxer.write_frame(&[0, 1, 0, 2], 2).unwrap();
        assert!(muxer.drain().is_empty());
    }

    #[test]
    fn finished_file_reads_back() {
        let mut muxer = WavMuxer::new(44_100, 2).unwrap();
        let samples: Vec<i16> = vec![100, -100, 2000, -2000];
        let packet: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        muxer.write_frame(&packet, 2).unwrap();
        let file = muxer.finish().unwrap().concat();

        let mut reader = hound::WavReader::new(Cursor::new(file)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn empty_recording_is_a_valid_header_only_file() {
        let mut muxer = WavMuxer::new(48_000, 1).unwrap();
        let file = muxer.finish().unwrap().concat();
        let mut reader = hound::WavReader::new(Cursor::new(file)).unwrap();
        assert_eq!(reader.samples::<i16>().count(), 0);
    }

    #[test]
    fn write_after_finish_fails() {
        let mut muxer = WavMuxer::new(48_000, 1).unwrap();
        muxer.finish().unwrap();
        assert!(muxer.write_frame(&[0, 0], 1).is_err());
    }
}
