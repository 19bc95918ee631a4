//! Encoding pipeline: interleave, accumulate, resample, encode, mux
//!
//! The pipeline consumes arbitrarily sized capture chunks and produces fixed
//! 20 ms codec frames. All working buffers are sized once at construction;
//! the steady state allocates nothing per chunk.

use std::mem;

use thiserror::Error;

use crate::application::ports::{
    CodecError, ContainerMuxer, FrameCodec, MuxError, ResampleError, SampleResampler,
};
use crate::domain::mime::ContainerFormat;
use crate::domain::recording::FrameChunk;

/// Codec frame duration. Sample rates must divide into whole frames.
pub const FRAME_DURATION_MS: u32 = 20;

/// Fatal pipeline failures. The context that hits one drops its capability
/// handles and closes; nothing is retried.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Mux(#[from] MuxError),

    #[error("sample rate {0} Hz does not divide into whole {FRAME_DURATION_MS} ms frames")]
    FrameAlignment(u32),

    #[error("no muxer available for {0}")]
    UnsupportedContainer(ContainerFormat),
}

impl PipelineError {
    /// Stable error name reported to callers alongside the detail message.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineError::Resample(_) => "ResampleError",
            PipelineError::Codec(_) => "CodecError",
            PipelineError::Mux(_) => "MuxError",
            PipelineError::FrameAlignment(_) => "FrameAlignmentError",
            PipelineError::UnsupportedContainer(_) => "UnsupportedContainerError",
        }
    }
}

/// Samples per channel in one codec frame at `sample_rate`, if integral.
pub fn samples_per_frame(sample_rate: u32) -> Result<usize, PipelineError> {
    if (sample_rate * FRAME_DURATION_MS) % 1000 != 0 {
        return Err(PipelineError::FrameAlignment(sample_rate));
    }
    Ok((sample_rate * FRAME_DURATION_MS / 1000) as usize)
}

enum Staged {
    Mono(FrameChunk),
    Interleaved(Vec<f32>, usize),
}

impl Staged {
    fn samples(&self) -> &[f32] {
        match self {
            Staged::Mono(chunk) => &chunk.channels()[0],
            Staged::Interleaved(buf, len) => &buf[..*len],
        }
    }
}

/// One session's encoding machinery: resampler, codec, and muxer handles plus
/// the interleaved frame accumulator.
pub struct EncodingPipeline {
    resampler: Box<dyn SampleResampler>,
    codec: Box<dyn FrameCodec>,
    muxer: Box<dyn ContainerMuxer>,
    channels: usize,
    output_samples_per_channel: usize,
    /// Interleaved staging area for multichannel chunks, grown on demand
    interleave_buf: Vec<f32>,
    /// Exactly one input frame of interleaved samples
    accumulator: Vec<f32>,
    fill: usize,
}

impl EncodingPipeline {
    pub fn new(
        resampler: Box<dyn SampleResampler>,
        codec: Box<dyn FrameCodec>,
        muxer: Box<dyn ContainerMuxer>,
        channels: u16,
        input_samples_per_channel: usize,
        output_samples_per_channel: usize,
    ) -> Self {
        let channels = channels as usize;
        Self {
            resampler,
            codec,
            muxer,
            channels,
            output_samples_per_channel,
            interleave_buf: Vec::new(),
            accumulator: vec![0.0; input_samples_per_channel * channels],
            fill: 0,
        }
    }

    /// Absorb one capture chunk, flushing a codec frame every time the
    /// accumulator fills. A large chunk may flush several frames.
    pub fn push(&mut self, chunk: FrameChunk) -> Result<(), PipelineError> {
        let staged = self.stage(chunk);
        let total = staged.samples().len();

        let mut index = 0;
        while index < total {
            let take = (self.accumulator.len() - self.fill).min(total - index);
            self.accumulator[self.fill..self.fill + take]
                .copy_from_slice(&staged.samples()[index..index + take]);
            self.fill += take;
            index += take;

            if self.fill == self.accumulator.len() {
                self.flush_frame()?;
            }
        }

        if let Staged::Interleaved(buf, _) = staged {
            self.interleave_buf = buf;
        }
        Ok(())
    }

    /// Hand out the container bytes completed so far. Never flushes a
    /// partial accumulator, so repeated calls without new input yield
    /// nothing after the first.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        self.muxer.drain()
    }

    /// Pad any partial frame with silence, flush it, and close the
    /// container, returning all remaining bytes. An accumulator that is
    /// exactly empty needs no padding frame. Capability handles are released
    /// when the pipeline drops.
    pub fn finish(mut self) -> Result<Vec<Vec<u8>>, PipelineError> {
        if self.fill > 0 {
            let len = self.accumulator.len();
            self.accumulator[self.fill..len].fill(0.0);
            self.fill = len;
            self.flush_frame()?;
        }
        Ok(self.muxer.finish()?)
    }

    /// Channel-major interleave; mono chunks pass through untouched.
    fn stage(&mut self, chunk: FrameChunk) -> Staged {
        if chunk.channel_count() == 1 {
            return Staged::Mono(chunk);
        }
        let samples = chunk.sample_count();
        let total = samples * self.channels;
        let mut buf = mem::take(&mut self.interleave_buf);
        if buf.len() < total {
            buf.resize(total, 0.0);
        }
        for (ch, channel) in chunk.channels().iter().take(self.channels).enumerate() {
            for (i, &sample) in channel.iter().enumerate() {
                buf[i * self.channels + ch] = sample;
            }
        }
        Staged::Interleaved(buf, total)
    }

    fn flush_frame(&mut self) -> Result<(), PipelineError> {
        let resampled = self.resampler.process(&self.accumulator)?;
        let packet = self.codec.encode(resampled)?;
        self.muxer
            .write_frame(packet, self.output_samples_per_channel as u32)?;
        self.fill = 0;
        Ok(())
    }
}
