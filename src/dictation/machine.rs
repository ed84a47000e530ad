//! Capture lifecycle state machine
//!
//! Folds recognizer events into `Idle`/`Listening` and the UI actions each
//! transition implies:
//! - Idle -> Listening on `Started`
//! - Listening -> Idle on `Result`, `Error`, or `Ended`
//!
//! `Ended` resets the label unconditionally, so a session always finishes idle.

use std::fmt;

use super::CaptureEvent;
use crate::surface::{LABEL_IDLE, LABEL_LISTENING};
use crate::{Error, Result};

/// Capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    /// No capture session open
    #[default]
    Idle,
    /// Capture session open, waiting for a result
    Listening,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Listening => write!(f, "Listening"),
        }
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAction {
    /// Replace the trigger label
    SetLabel(&'static str),
    /// Hand the transcript to the answer pipeline
    EmitTranscript(String),
    /// Report a capture failure on the diagnostic channel
    Diagnostic(String),
}

/// Dictation trigger state machine
#[derive(Debug, Default)]
pub struct DictationMachine {
    state: CaptureState,
    /// Whether the open session already produced its transcript
    emitted: bool,
}

impl DictationMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// Check whether a user-initiated start may proceed
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` while a session is already listening
    pub fn request_start(&self) -> Result<()> {
        match self.state {
            CaptureState::Idle => Ok(()),
            CaptureState::Listening => Err(Error::Busy),
        }
    }

    /// Apply one recognizer event and return the actions it implies
    pub fn dispatch(&mut self, event: CaptureEvent) -> Vec<CaptureAction> {
        let from = self.state;

        let actions = match (self.state, event) {
            (CaptureState::Idle, CaptureEvent::Started) => {
                self.state = CaptureState::Listening;
                self.emitted = false;
                vec![CaptureAction::SetLabel(LABEL_LISTENING)]
            }
            (CaptureState::Listening, CaptureEvent::Started) => Vec::new(),
            (CaptureState::Listening, CaptureEvent::Result(text)) => {
                self.state = CaptureState::Idle;
                self.emitted = true;
                vec![
                    CaptureAction::EmitTranscript(text),
                    CaptureAction::SetLabel(LABEL_IDLE),
                ]
            }
            (CaptureState::Idle, CaptureEvent::Result(text)) => {
                if self.emitted {
                    tracing::debug!(len = text.len(), "dropping extra recognition result");
                } else {
                    tracing::warn!("recognition result without an open session");
                }
                Vec::new()
            }
            (_, CaptureEvent::Error(detail)) => {
                self.state = CaptureState::Idle;
                vec![
                    CaptureAction::Diagnostic(detail),
                    CaptureAction::SetLabel(LABEL_IDLE),
                ]
            }
            (_, CaptureEvent::Ended) => {
                self.state = CaptureState::Idle;
                vec![CaptureAction::SetLabel(LABEL_IDLE)]
            }
        };

        if from != self.state {
            tracing::debug!("capture state: {from} -> {}", self.state);
        }

        actions
    }
}
