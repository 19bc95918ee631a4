//! Application layer - ports, the encoding pipeline, and the recorder

pub mod pipeline;
pub mod ports;
pub mod recorder;
pub mod worker;
