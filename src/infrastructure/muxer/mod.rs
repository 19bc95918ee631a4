//! Container muxer adapters

pub mod ogg;
mod sink;
pub mod wav;

pub use self::ogg::OggOpusMuxer;
pub use self::wav::WavMuxer;
