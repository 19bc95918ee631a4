//! Resampler adapters

pub mod passthrough;
pub mod rubato;

pub use self::passthrough::PassthroughResampler;
pub use self::rubato::RubatoResampler;
