//! Container backend selection
//!
//! Each supported container pairs a resampler, a codec, and a muxer. The
//! pairing is fixed per container: Ogg always carries Opus at 48 kHz, WAV
//! always carries linear PCM at the native capture rate.

use crate::application::pipeline::{samples_per_frame, EncodingPipeline, PipelineError};
use crate::application::worker::EncoderFactory;
use crate::domain::mime::ContainerFormat;
use crate::infrastructure::codec::opus::{OpusFrameCodec, OPUS_SAMPLE_RATE};
use crate::infrastructure::codec::pcm::PcmFrameCodec;
use crate::infrastructure::muxer::ogg::OggOpusMuxer;
use crate::infrastructure::muxer::wav::WavMuxer;
use crate::infrastructure::resampler::passthrough::PassthroughResampler;
use crate::infrastructure::resampler::rubato::RubatoResampler;
use crate::application::ports::SampleResampler;

/// The container/codec pairings this build can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderBackend {
    OggOpus,
    Wav,
}

impl EncoderBackend {
    pub fn for_format(format: ContainerFormat) -> Option<Self> {
        match format {
            ContainerFormat::Ogg => Some(EncoderBackend::OggOpus),
            ContainerFormat::Wave => Some(EncoderBackend::Wav),
            // Parses as supported but this build ships no WebM muxer
            ContainerFormat::Webm => None,
        }
    }
}

/// Factory assembling the real capability handles at init time
pub struct StandardEncoderFactory;

impl EncoderFactory for StandardEncoderFactory {
    fn build(
        &self,
        format: ContainerFormat,
        sample_rate: u32,
        channels: u16,
        bitrate: Option<u32>,
    ) -> Result<EncodingPipeline, PipelineError> {
        let backend = EncoderBackend::for_format(format)
            .ok_or(PipelineError::UnsupportedContainer(format))?;
        let input_frame = samples_per_frame(sample_rate)?;

        match backend {
            EncoderBackend::OggOpus => {
                let output_frame = samples_per_frame(OPUS_SAMPLE_RATE)?;
                let resampler: Box<dyn SampleResampler> = if sample_rate == OPUS_SAMPLE_RATE {
                    Box::new(PassthroughResampler)
                } else {
                    Box::new(RubatoResampler::new(
                        sample_rate,
                        OPUS_SAMPLE_RATE,
                        input_frame,
                        output_frame,
                        channels,
                    )?)
                };
                let codec = OpusFrameCodec::new(channels, bitrate)?;
                let muxer = OggOpusMuxer::new(channels, sample_rate)?;
                Ok(EncodingPipeline::new(
                    resampler,
                    Box::new(codec),
                    Box::new(muxer),
                    channels,
                    input_frame,
                    output_frame,
                ))
            }
            EncoderBackend::Wav => {
                let codec = PcmFrameCodec::new(channels, input_frame);
                let muxer = WavMuxer::new(sample_rate, channels)?;
                Ok(EncodingPipeline::new(
                    Box::new(PassthroughResampler),
                    Box::new(codec),
                    Box::new(muxer),
                    channels,
                    input_frame,
                    input_frame,
                ))
            }
        }
    }
}
