//! Domain error types

use thiserror::Error;

use crate::domain::recording::RecorderState;

/// Error when a MIME descriptor string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MIME descriptor: \"{input}\"")]
pub struct MimeParseError {
    pub input: String,
}

/// Error when a duration string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration: \"{input}\" (expected formats like \"90\", \"30s\", \"1m30s\")")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a lifecycle operation is attempted in the wrong state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while {from}")]
pub struct InvalidStateTransition {
    pub from: RecorderState,
    pub action: &'static str,
}

/// Error when per-channel sample buffers do not line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chunk channels must be non-empty and equally sized")]
pub struct ChunkShapeError;
