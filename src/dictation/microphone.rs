//! Microphone recognizer: cpal capture, energy endpointing, Whisper STT

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::mpsc;

use super::{CaptureEvent, CaptureOptions, Recognizer};
use crate::voice::{
    AudioCapture, SAMPLE_RATE, SpeechToText, UtteranceDetector, duration_secs, samples_to_wav,
};
use crate::{Error, Result};

/// How often the capture buffer is drained into the detector
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Records one utterance and transcribes it
pub struct MicrophoneRecognizer {
    stt: Option<SpeechToText>,
    max_listen: Duration,
}

impl MicrophoneRecognizer {
    /// Create a recognizer; without an API key it reports itself unsupported
    #[must_use]
    pub fn new(api_key: Option<SecretString>, stt_model: String, max_listen: Duration) -> Self {
        let stt = api_key.and_then(|key| match SpeechToText::new(key, stt_model) {
            Ok(stt) => Some(stt),
            Err(e) => {
                tracing::warn!(error = %e, "speech-to-text unavailable");
                None
            }
        });

        Self { stt, max_listen }
    }

    async fn capture_and_transcribe(&self, stt: &SpeechToText, language: &str) -> Result<String> {
        let max_listen = self.max_listen;
        let samples = tokio::task::spawn_blocking(move || record_utterance(max_listen))
            .await
            .map_err(|e| Error::Capture(e.to_string()))??;

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let transcript = stt.transcribe(&wav, language).await?;

        if transcript.is_empty() {
            return Err(Error::Capture("no-match".to_string()));
        }
        Ok(transcript)
    }
}

#[async_trait]
impl Recognizer for MicrophoneRecognizer {
    fn name(&self) -> &'static str {
        "microphone"
    }

    fn is_supported(&self) -> bool {
        self.stt.is_some() && AudioCapture::is_available()
    }

    async fn listen(&self, options: &CaptureOptions, events: mpsc::Sender<CaptureEvent>) {
        let _ = events.send(CaptureEvent::Started).await;

        let outcome = match &self.stt {
            Some(stt) => self.capture_and_transcribe(stt, options.language()).await,
            None => Err(Error::CaptureUnsupported("speech-to-text not configured".to_string())),
        };

        let event = match outcome {
            Ok(transcript) => CaptureEvent::Result(transcript),
            Err(Error::Capture(detail)) => CaptureEvent::Error(detail),
            Err(e) => CaptureEvent::Error(e.to_string()),
        };
        let _ = events.send(event).await;
        let _ = events.send(CaptureEvent::Ended).await;
    }
}

/// Record from the default microphone until an utterance completes
///
/// Blocking; holds the cpal stream on the calling thread.
fn record_utterance(max_listen: Duration) -> Result<Vec<f32>> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let mut detector = UtteranceDetector::new();
    let started = Instant::now();

    loop {
        std::thread::sleep(CHUNK_INTERVAL);

        let chunk = capture.take_buffer();
        if detector.process(&chunk) {
            break;
        }

        if started.elapsed() >= max_listen {
            if detector.heard_speech() {
                tracing::debug!("listen limit reached mid-utterance");
                break;
            }
            return Err(Error::Capture("no-speech".to_string()));
        }
    }

    capture.stop();
    let utterance = detector.take_utterance();
    tracing::debug!(seconds = duration_secs(utterance.len()), "utterance recorded");
    Ok(utterance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_key_unsupported() {
        let recognizer =
            MicrophoneRecognizer::new(None, "whisper-1".to_string(), Duration::from_secs(5));
        assert!(!recognizer.is_supported());
        assert_eq!(recognizer.name(), "microphone");
    }

    #[tokio::test]
    async fn test_unsupported_listen_reports_error_and_ends() {
        let recognizer =
            MicrophoneRecognizer::new(None, "whisper-1".to_string(), Duration::from_secs(5));
        let (tx, mut rx) = mpsc::channel(8);

        recognizer.listen(&CaptureOptions::default(), tx).await;

        assert_eq!(rx.recv().await, Some(CaptureEvent::Started));
        assert!(matches!(rx.recv().await, Some(CaptureEvent::Error(_))));
        assert_eq!(rx.recv().await, Some(CaptureEvent::Ended));
        assert_eq!(rx.recv().await, None);
    }
}
