//! FFT-based fixed-ratio resampler adapter
//!
//! Wraps `rubato::FftFixedInOut`, which consumes and produces fixed-size
//! frames, exactly the shape the pipeline works in. The adapter de-interleaves
//! into per-channel scratch buffers, resamples, and re-interleaves, reusing
//! every buffer across calls.

use rubato::{FftFixedInOut, Resampler};

use crate::application::ports::{ResampleError, SampleResampler};

pub struct RubatoResampler {
    inner: FftFixedInOut<f32>,
    channels: usize,
    output_samples_per_channel: usize,
    split_input: Vec<Vec<f32>>,
    split_output: Vec<Vec<f32>>,
    interleaved: Vec<f32>,
}

impl RubatoResampler {
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        input_samples_per_channel: usize,
        output_samples_per_channel: usize,
        channels: u16,
    ) -> Result<Self, ResampleError> {
        let channels = channels as usize;
        let inner = FftFixedInOut::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            input_samples_per_channel,
            channels,
        )
        .map_err(|e| ResampleError::CreateFailed(e.to_string()))?;

        // The pipeline feeds exactly one codec frame per call; reject rate
        // pairs the FFT resampler cannot honor at that chunk size
        if inner.input_frames_next() != input_samples_per_channel
            || inner.output_frames_next() != output_samples_per_channel
        {
            return Err(ResampleError::CreateFailed(format!(
                "cannot resample {} Hz to {} Hz in {}-sample frames",
                input_rate, output_rate, input_samples_per_channel
            )));
        }

        let split_output = inner.output_buffer_allocate(true);
        Ok(Self {
            inner,
            channels,
            output_samples_per_channel,
            split_input: vec![vec![0.0; input_samples_per_channel]; channels],
            split_output,
            interleaved: vec![0.0; output_samples_per_channel * channels],
        })
    }
}

impl SampleResampler for RubatoResampler {
    fn process<'a>(&'a mut self, input: &'a [f32]) -> Result<&'a [f32], ResampleError> {
        for (ch, buffer) in self.split_input.iter_mut().enumerate() {
            for (i, sample) in buffer.iter_mut().enumerate() {
                *sample = input[i * self.channels + ch];
            }
        }

        let (_, produced) = self
            .inner
            .process_into_buffer(&self.split_input, &mut self.split_output, None)
            .map_err(|e| ResampleError::ProcessFailed(e.to_string()))?;
        if produced != self.output_samples_per_channel {
            return Err(ResampleError::ProcessFailed(format!(
                "expected {} output samples per channel, got {}",
                self.output_samples_per_channel, produced
            )));
        }

        for (ch, buffer) in self.split_output.iter().enumerate() {
            for (i, &sample) in buffer.iter().take(produced).enumerate() {
                self.interleaved[i * self.channels + ch] = sample;
            }
        }
        Ok(&self.interleaved)
    }
}
