//! Frame codec adapters

pub mod opus;
pub mod pcm;

pub use self::opus::OpusFrameCodec;
pub use self::pcm::PcmFrameCodec;
