//! Sample and byte buffer value objects

use crate::domain::error::ChunkShapeError;

/// One capture callback's worth of raw audio, one `Vec<f32>` per channel.
///
/// Chunks move by value from the capture thread into the encoding context and
/// are consumed there; nothing reads a chunk after handing it off.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameChunk {
    channels: Vec<Vec<f32>>,
    sample_count: usize,
    duration_secs: f64,
}

impl FrameChunk {
    /// Build a chunk from per-channel buffers captured at `sample_rate`.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, ChunkShapeError> {
        let sample_count = match channels.first() {
            Some(first) => first.len(),
            None => return Err(ChunkShapeError),
        };
        if channels.iter().any(|c| c.len() != sample_count) {
            return Err(ChunkShapeError);
        }
        Ok(Self {
            channels,
            sample_count,
            duration_secs: sample_count as f64 / sample_rate as f64,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }
}

/// Ordered compressed byte buffers produced by one flush.
///
/// The final artifact is the concatenation of every delivered chunk in
/// delivery order. An incremental flush may legitimately be empty when the
/// muxer has not completed a page since the previous flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedChunk {
    buffers: Vec<Vec<u8>>,
}

impl EncodedChunk {
    pub fn new(buffers: Vec<Vec<u8>>) -> Self {
        Self { buffers }
    }

    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    pub fn byte_len(&self) -> usize {
        self.buffers.iter().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Flatten into one contiguous byte buffer, preserving order.
    pub fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for buffer in &self.buffers {
            out.extend_from_slice(buffer);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_duration_follows_sample_rate() {
        let chunk = FrameChunk::new(vec![vec![0.0; 480]], 48_000).unwrap();
        assert_eq!(chunk.sample_count(), 480);
        assert!((chunk.duration_secs() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn mismatched_channel_lengths_rejected() {
        let result = FrameChunk::new(vec![vec![0.0; 4], vec![0.0; 3]], 48_000);
        assert_eq!(result.unwrap_err(), ChunkShapeError);
    }

    #[test]
    fn empty_channel_list_rejected() {
        assert!(FrameChunk::new(Vec::new(), 48_000).is_err());
    }

    #[test]
    fn encoded_chunk_concat_preserves_order() {
        let chunk = EncodedChunk::new(vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(chunk.byte_len(), 3);
        assert_eq!(chunk.concat(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_encoded_chunk() {
        assert!(EncodedChunk::default().is_empty());
        assert!(EncodedChunk::new(vec![Vec::new()]).is_empty());
    }
}
