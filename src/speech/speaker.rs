//! OpenAI TTS played on the default output device

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::Synthesizer;
use crate::voice::{AudioPlayback, PlaybackHandle, TextToSpeech, decode_mp3};
use crate::{Error, Result};

/// Poll interval for `wait_idle`
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Speaks through the speakers; newest utterance wins
pub struct SpeakerSynthesizer {
    tts: TextToSpeech,
    current: Mutex<Option<PlaybackHandle>>,
    /// Bumped by every `cancel` and `speak`; a synthesis that finishes after
    /// a newer request is discarded
    generation: AtomicU64,
}

impl SpeakerSynthesizer {
    #[must_use]
    pub const fn new(tts: TextToSpeech) -> Self {
        Self {
            tts,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether an output device is present
    #[must_use]
    pub fn is_available() -> bool {
        AudioPlayback::is_available()
    }

    fn stop_current(&self) {
        if let Ok(mut current) = self.current.lock()
            && let Some(handle) = current.take()
        {
            handle.stop();
        }
    }
}

#[async_trait]
impl Synthesizer for SpeakerSynthesizer {
    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_current();
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let audio = self.tts.synthesize(text).await?;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("utterance superseded before playback");
            return Ok(());
        }

        let handle = tokio::task::spawn_blocking(move || {
            let samples = decode_mp3(&audio)?;
            AudioPlayback::start(samples)
        })
        .await
        .map_err(|e| Error::Audio(e.to_string()))??;

        if self.generation.load(Ordering::SeqCst) != generation {
            handle.stop();
            return Ok(());
        }

        let mut current = self
            .current
            .lock()
            .map_err(|_| Error::Audio("playback state poisoned".to_string()))?;
        if let Some(previous) = current.replace(handle) {
            previous.stop();
        }

        tracing::debug!(chars = text.len(), "utterance started");
        Ok(())
    }

    async fn wait_idle(&self) {
        loop {
            let playing = self
                .current
                .lock()
                .map(|current| current.as_ref().is_some_and(|h| !h.is_finished()))
                .unwrap_or(false);
            if !playing {
                return;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }
}
