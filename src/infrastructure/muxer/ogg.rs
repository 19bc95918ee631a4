//! Ogg/Opus container muxer
//!
//! Writes the OpusHead and OpusTags header pages up front, then frames each
//! Opus packet with its running granule position. The latest audio packet is
//! held back one call so the stream-end flag can be set on the true last
//! packet at finish time.

use std::time::{SystemTime, UNIX_EPOCH};

use ogg::writing::{PacketWriteEndInfo, PacketWriter};

use crate::application::ports::{ContainerMuxer, MuxError};
use crate::infrastructure::codec::opus::OPUS_SAMPLE_RATE;
use crate::infrastructure::muxer::sink::SharedBuffer;

const VENDOR: &str = concat!("opus-recorder ", env!("CARGO_PKG_VERSION"));

pub struct OggOpusMuxer {
    writer: PacketWriter<SharedBuffer>,
    bytes: SharedBuffer,
    serial: u32,
    /// Total 48 kHz samples per channel written so far
    granule: u64,
    /// (packet, granule position) awaiting the next write or finish
    pending: Option<(Vec<u8>, u64)>,
}

impl OggOpusMuxer {
    /// `input_sample_rate` is informational in the header; granule positions
    /// always count samples at the Opus operating rate.
    pub fn new(channels: u16, input_sample_rate: u32) -> Result<Self, MuxError> {
        let bytes = SharedBuffer::new();
        let mut writer = PacketWriter::new(bytes.clone());
        let serial = rand_serial();

        let failed = |e: std::io::Error| MuxError::CreateFailed(e.to_string());
        writer
            .write_packet(
                id_header(channels, input_sample_rate).into(),
                serial,
                PacketWriteEndInfo::EndPage,
                0,
            )
            .map_err(failed)?;
        writer
            .write_packet(
                comment_header().into(),
                serial,
                PacketWriteEndInfo::EndPage,
                0,
            )
            .map_err(failed)?;

        Ok(Self {
            writer,
            bytes,
            serial,
            granule: 0,
            pending: None,
        })
    }
}

impl ContainerMuxer for OggOpusMuxer {
    fn write_frame(&mut self, packet: &[u8], samples_per_channel: u32) -> Result<(), MuxError> {
        self.granule += samples_per_channel as u64;
        let previous = self.pending.replace((packet.to_vec(), self.granule));
        if let Some((data, granule)) = previous {
            self.writer
                .write_packet(
                    data.into(),
                    self.serial,
                    PacketWriteEndInfo::NormalPacket,
                    granule,
                )
                .map_err(|e| MuxError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<Vec<u8>> {
        let completed = self.bytes.take();
        if completed.is_empty() {
            Vec::new()
        } else {
            vec![completed]
        }
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>, MuxError> {
        if let Some((data, granule)) = self.pending.take() {
            self.writer
                .write_packet(
                    data.into(),
                    self.serial,
                    PacketWriteEndInfo::EndStream,
                    granule,
                )
                .map_err(|e| MuxError::CloseFailed(e.to_string()))?;
        }
        Ok(self.drain())
    }
}

/// OpusHead identification header (RFC 7845 section 5.1)
fn id_header(channels: u16, input_sample_rate: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(19);
    header.extend_from_slice(b"OpusHead");
    header.push(1); // version
    header.push(channels as u8);
    header.extend_from_slice(&0u16.to_le_bytes()); // pre-skip
    header.extend_from_slice(&input_sample_rate.to_le_bytes());
    header.extend_from_slice(&0i16.to_le_bytes()); // output gain
    header.push(0); // channel mapping family
    header
}

/// OpusTags comment header (RFC 7845 section 5.2)
fn comment_header() -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(b"OpusTags");
    header.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
    header.extend_from_slice(VENDOR.as_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // user comment count
    header
}

/// Time-derived stream serial; streams started in the same process get
/// distinct pages even without an RNG dependency.
fn rand_serial() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    (nanos as u32) ^ ((nanos >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn header_pages_written_up_front() {
        let mut muxer = OggOpusMuxer::new(2, 44_100).unwrap();
        let bytes = muxer.drain().concat();
        assert_eq!(&bytes[..4], b"OggS");
        assert!(contains(&bytes, b"OpusHead"));
        assert!(contains(&bytes, b"OpusTags"));
    }

    #[test]
    fn id_header_carries_input_rate_and_channels() {
        let header = id_header(2, 44_100);
        assert_eq!(header.len(), 19);
        assert_eq!(header[9], 2);
        assert_eq!(
            u32::from_le_bytes([header[12], header[13], header[14], header[15]]),
            44_100
        );
    }

    #[test]
    fn finish_flushes_the_held_back_packet() {
        let samples = OPUS_SAMPLE_RATE / 50; // one 20 ms frame
        let mut muxer = OggOpusMuxer::new(1, 48_000).unwrap();
        muxer.drain();
        muxer.write_frame(&[0x11; 40], samples).unwrap();
        // First audio packet is withheld until another write or finish
        assert!(muxer.drain().is_empty());
        let tail = muxer.finish().unwrap().concat();
        assert!(contains(&tail, &[0x11; 40]));
    }

    #[test]
    fn last_page_carries_the_end_of_stream_flag() {
        let samples = OPUS_SAMPLE_RATE / 50;
        let mut muxer = OggOpusMuxer::new(1, 48_000).unwrap();
        for _ in 0..3 {
            muxer.write_frame(&[0x22; 24], samples).unwrap();
        }
        let mut bytes = muxer.drain().concat();
        bytes.extend(muxer.finish().unwrap().concat());

        // Header type flag of the last page has bit 2 (EOS) set
        let last_page = bytes
            .windows(4)
            .enumerate()
            .filter(|(_, w)| w == b"OggS")
            .map(|(i, _)| i)
            .next_back()
            .unwrap();
        assert_eq!(bytes[last_page + 5] & 0x04, 0x04);
    }

    #[test]
    fn finish_without_audio_leaves_headers_only() {
        let mut muxer = OggOpusMuxer::new(1, 48_000).unwrap();
        let headers = muxer.drain().concat();
        assert!(!headers.is_empty());
        assert!(muxer.finish().unwrap().concat().is_empty());
    }
}
