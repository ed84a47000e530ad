//! Dictation trigger
//!
//! A `Recognizer` turns one capture session into a stream of
//! `CaptureEvent`s; `DictationMachine` folds them into UI state and the
//! transcript handed to the answer pipeline.

mod keyboard;
mod machine;
mod microphone;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use keyboard::KeyboardRecognizer;
pub use machine::{CaptureAction, CaptureState, DictationMachine};
pub use microphone::MicrophoneRecognizer;

use crate::config::DEFAULT_LOCALE;

/// Event produced by a recognizer during one capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Capture began
    Started,
    /// Top candidate of the first final result
    Result(String),
    /// Capture failed
    Error(String),
    /// Session closed, with or without a result
    Ended,
}

/// Parameters for one capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Keep listening after the first result
    pub continuous: bool,

    /// Report partial hypotheses
    pub interim_results: bool,

    /// BCP 47 locale, e.g. "en-US"
    pub locale: String,
}

impl CaptureOptions {
    /// Single-shot, final-only capture in `locale`
    #[must_use]
    pub fn single_shot(locale: impl Into<String>) -> Self {
        Self {
            continuous: false,
            interim_results: false,
            locale: locale.into(),
        }
    }

    /// Primary language subtag ("en" for "en-US")
    #[must_use]
    pub fn language(&self) -> &str {
        self.locale.split(['-', '_']).next().unwrap_or(&self.locale)
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::single_shot(DEFAULT_LOCALE)
    }
}

/// Speech-to-text collaborator
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether capture can work on this platform at all
    fn is_supported(&self) -> bool;

    /// Whether the input source has closed for good (e.g. stdin at EOF)
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Run one capture session
    ///
    /// Sends `Started`, then at most one `Result` or an `Error`, then `Ended`.
    async fn listen(&self, options: &CaptureOptions, events: mpsc::Sender<CaptureEvent>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_single_shot() {
        let options = CaptureOptions::default();
        assert!(!options.continuous);
        assert!(!options.interim_results);
        assert_eq!(options.locale, "en-US");
    }

    #[test]
    fn test_language_subtag() {
        assert_eq!(CaptureOptions::single_shot("en-US").language(), "en");
        assert_eq!(CaptureOptions::single_shot("pt_BR").language(), "pt");
        assert_eq!(CaptureOptions::single_shot("de").language(), "de");
    }
}
