//! Speech synthesis collaborator
//!
//! At most one utterance is audible at a time: callers cancel before they
//! speak, and a new `speak` supersedes whatever is still playing.

mod console;
mod speaker;

use async_trait::async_trait;

pub use console::ConsoleSynthesizer;
pub use speaker::SpeakerSynthesizer;

use crate::Result;

/// Turns answer text into audible (or visible) speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Stop the current utterance and drop anything queued
    fn cancel(&self);

    /// Start speaking `text`; returns once the utterance has started
    async fn speak(&self, text: &str) -> Result<()>;

    /// Wait until nothing is being spoken
    async fn wait_idle(&self) {}
}

/// Cancel any active utterance, then speak `text`
///
/// # Errors
///
/// Returns error if the synthesizer fails to start the utterance
pub async fn say(synthesizer: &dyn Synthesizer, text: &str) -> Result<()> {
    synthesizer.cancel();
    synthesizer.speak(text).await
}
