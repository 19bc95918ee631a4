//! No-op resampler for when capture already runs at the codec rate

use crate::application::ports::{ResampleError, SampleResampler};

pub struct PassthroughResampler;

impl SampleResampler for PassthroughResampler {
    fn process<'a>(&'a mut self, input: &'a [f32]) -> Result<&'a [f32], ResampleError> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_input_unchanged() {
        let mut resampler = PassthroughResampler;
        let input = [0.1_f32, -0.2, 0.3];
        assert_eq!(resampler.process(&input).unwrap(), &input);
    }
}
