//! Dictation session: recognizer -> state machine -> answer pipeline

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::dictation::{
    CaptureAction, CaptureEvent, CaptureOptions, CaptureState, DictationMachine, Recognizer,
};
use crate::pipeline::{AnswerPipeline, Resolution};
use crate::surface::{LABEL_IDLE, UNSUPPORTED_MESSAGE};
use crate::{Error, Result};

/// Buffer for recognizer events; a session emits at most three
const EVENT_BUFFER: usize = 8;

/// Returns the machine to `Idle` when a capture session goes out of scope
struct CaptureGuard<'a>(&'a Session);

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.0.close_capture();
    }
}

/// Couples one recognizer with the answer pipeline
pub struct Session {
    recognizer: Arc<dyn Recognizer>,
    pipeline: Arc<AnswerPipeline>,
    machine: Mutex<DictationMachine>,
    options: CaptureOptions,
    supported: bool,
}

impl Session {
    /// Set up the trigger
    ///
    /// If the recognizer is unsupported the trigger is disabled for good and
    /// the unsupported message is shown.
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        pipeline: Arc<AnswerPipeline>,
        options: CaptureOptions,
    ) -> Self {
        let supported = recognizer.is_supported();
        let surface = pipeline.surface();

        if supported {
            surface.set_label(LABEL_IDLE);
        } else {
            tracing::warn!(recognizer = recognizer.name(), "speech capture unsupported");
            surface.disable_trigger();
            surface.show_recognized(UNSUPPORTED_MESSAGE);
        }

        Self {
            recognizer,
            pipeline,
            machine: Mutex::new(DictationMachine::new()),
            options,
            supported,
        }
    }

    /// Whether capture can ever start
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether the recognizer's input has closed for good
    #[must_use]
    pub fn input_closed(&self) -> bool {
        self.recognizer.is_exhausted()
    }

    /// Current capture state
    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.machine
            .lock()
            .map_or(CaptureState::Idle, |machine| machine.state())
    }

    /// Run one capture session and answer its transcript
    ///
    /// Returns `Ok(None)` when the session ended without a transcript.
    ///
    /// # Errors
    ///
    /// - `Error::CaptureUnsupported` if capture is unavailable
    /// - `Error::Busy` if a capture session is already open
    /// - any answer pipeline error
    pub async fn trigger(&self) -> Result<Option<Resolution>> {
        if !self.supported {
            return Err(Error::CaptureUnsupported(UNSUPPORTED_MESSAGE.to_string()));
        }
        // Enter Listening before the recognizer runs so a concurrent trigger
        // sees the session as open; the recognizer's own `Started` is a no-op
        let opened = {
            let mut machine = self.lock_machine()?;
            machine.request_start()?;
            machine.dispatch(CaptureEvent::Started)
        };
        for action in opened {
            self.perform(action);
        }
        let capture = CaptureGuard(self);

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

        let listen = self.recognizer.listen(&self.options, tx);
        let drain = async {
            let mut transcript = None;
            while let Some(event) = rx.recv().await {
                for action in self.apply(event)? {
                    if let Some(text) = self.perform(action) {
                        transcript = Some(text);
                    }
                }
            }
            Ok::<_, Error>(transcript)
        };

        let ((), transcript) = tokio::join!(listen, drain);
        drop(capture);

        match transcript? {
            Some(text) => self.pipeline.resolve_and_speak(&text).await.map(Some),
            None => Ok(None),
        }
    }

    /// Close a session the recognizer left open (no `Ended`, or cancelled)
    fn close_capture(&self) {
        let actions = match self.machine.lock() {
            Ok(mut machine) if machine.state() == CaptureState::Listening => {
                tracing::debug!(recognizer = self.recognizer.name(), "capture ended without Ended event");
                machine.dispatch(CaptureEvent::Ended)
            }
            _ => return,
        };
        for action in actions {
            self.perform(action);
        }
    }

    fn lock_machine(&self) -> Result<std::sync::MutexGuard<'_, DictationMachine>> {
        self.machine
            .lock()
            .map_err(|_| Error::Capture("dictation state poisoned".to_string()))
    }

    fn apply(&self, event: CaptureEvent) -> Result<Vec<CaptureAction>> {
        Ok(self.lock_machine()?.dispatch(event))
    }

    /// Carry out one action; returns the transcript if this action emits it
    fn perform(&self, action: CaptureAction) -> Option<String> {
        match action {
            CaptureAction::SetLabel(label) => {
                self.pipeline.surface().set_label(label);
                None
            }
            CaptureAction::Diagnostic(detail) => {
                tracing::error!(recognizer = self.recognizer.name(), error = %detail, "speech recognition error");
                None
            }
            CaptureAction::EmitTranscript(text) => {
                tracing::info!(transcript = %text, "transcript captured");
                Some(text)
            }
        }
    }
}
