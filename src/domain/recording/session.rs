//! Recording lifecycle state machine

use std::fmt;

use crate::domain::error::InvalidStateTransition;

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not recording; the only state that accepts `start`
    Inactive,
    /// Capturing and feeding the encoder
    Recording,
    /// Capture detached, encoder idle, session still open
    Paused,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecorderState::Inactive => "inactive",
            RecorderState::Recording => "recording",
            RecorderState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Session entity enforcing valid lifecycle transitions.
///
/// Every mutation validates the current state first; callers get the
/// precondition error back synchronously and the state is left untouched.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: RecorderState,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Inactive,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != RecorderState::Inactive
    }

    /// Inactive -> Recording
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Inactive => {
                self.state = RecorderState::Recording;
                Ok(())
            }
            from => Err(InvalidStateTransition { from, action: "start" }),
        }
    }

    /// Recording -> Paused
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Recording => {
                self.state = RecorderState::Paused;
                Ok(())
            }
            from => Err(InvalidStateTransition { from, action: "pause" }),
        }
    }

    /// Paused -> Recording
    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Paused => {
                self.state = RecorderState::Recording;
                Ok(())
            }
            from => Err(InvalidStateTransition { from, action: "resume" }),
        }
    }

    /// Recording | Paused -> Inactive
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Recording | RecorderState::Paused => {
                self.state = RecorderState::Inactive;
                Ok(())
            }
            from => Err(InvalidStateTransition { from, action: "stop" }),
        }
    }

    /// Flushing encoded data is valid whenever the session is open.
    pub fn check_request_data(&self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Recording | RecorderState::Paused => Ok(()),
            from => Err(InvalidStateTransition {
                from,
                action: "request data",
            }),
        }
    }

    /// Unconditional return to Inactive, used when the pipeline fails.
    pub fn abort(&mut self) {
        self.state = RecorderState::Inactive;
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_inactive() {
        let session = RecordingSession::new();
        assert_eq!(session.state(), RecorderState::Inactive);
        assert!(!session.is_active());
    }

    #[test]
    fn start_from_inactive_succeeds() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        assert_eq!(session.state(), RecorderState::Recording);
    }

    #[test]
    fn start_while_recording_fails() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        let err = session.start().unwrap_err();
        assert_eq!(err.from, RecorderState::Recording);
        assert_eq!(session.state(), RecorderState::Recording);
    }

    #[test]
    fn start_while_paused_fails() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        session.pause().unwrap();
        assert!(session.start().is_err());
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        session.pause().unwrap();
        assert_eq!(session.state(), RecorderState::Paused);
        session.resume().unwrap();
        assert_eq!(session.state(), RecorderState::Recording);
    }

    #[test]
    fn pause_while_inactive_fails() {
        let mut session = RecordingSession::new();
        assert!(session.pause().is_err());
    }

    #[test]
    fn pause_while_paused_fails() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        session.pause().unwrap();
        assert!(session.pause().is_err());
    }

    #[test]
    fn resume_while_recording_fails() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        assert!(session.resume().is_err());
    }

    #[test]
    fn resume_while_inactive_fails() {
        let mut session = RecordingSession::new();
        assert!(session.resume().is_err());
    }

    #[test]
    fn stop_from_recording_and_paused() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        session.stop().unwrap();
        assert_eq!(session.state(), RecorderState::Inactive);

        session.start().unwrap();
        session.pause().unwrap();
        session.stop().unwrap();
        assert_eq!(session.state(), RecorderState::Inactive);
    }

    #[test]
    fn stop_while_inactive_fails() {
        let mut session = RecordingSession::new();
        assert!(session.stop().is_err());
    }

    #[test]
    fn request_data_requires_open_session() {
        let mut session = RecordingSession::new();
        assert!(session.check_request_data().is_err());
        session.start().unwrap();
        assert!(session.check_request_data().is_ok());
        session.pause().unwrap();
        assert!(session.check_request_data().is_ok());
    }

    #[test]
    fn abort_resets_any_state() {
        let mut session = RecordingSession::new();
        session.start().unwrap();
        session.abort();
        assert_eq!(session.state(), RecorderState::Inactive);
        assert!(session.start().is_ok());
    }
}
