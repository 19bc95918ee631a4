//! Domain layer - pure types and business rules
//!
//! No I/O, no threads, no external services. Everything here is testable
//! without touching an audio device.

pub mod config;
pub mod error;
pub mod mime;
pub mod recording;
