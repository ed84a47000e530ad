//! End-of-utterance detection
//!
//! Energy-based endpointing: an utterance is speech of some minimum length
//! followed by a stretch of silence.

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to accept (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Progress of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceState {
    /// No speech heard yet
    Waiting,
    /// Speech heard, accumulating
    Speaking,
    /// Speech followed by enough silence
    Complete,
}

/// Accumulates one spoken utterance from a sample stream
#[derive(Debug)]
pub struct UtteranceDetector {
    state: UtteranceState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: UtteranceState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples; returns true once the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            UtteranceState::Waiting => {
                if is_speech {
                    self.state = UtteranceState::Speaking;
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                }
            }
            UtteranceState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES {
                    if self.speech_buffer.len() > MIN_SPEECH_SAMPLES + self.silence_counter {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        self.state = UtteranceState::Complete;
                    } else {
                        // Too short to be speech, treat as a click or cough
                        tracing::trace!("discarding short burst");
                        self.reset();
                    }
                }
            }
            UtteranceState::Complete => {}
        }

        self.state == UtteranceState::Complete
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> UtteranceState {
        self.state
    }

    /// Whether any speech has been heard
    #[must_use]
    pub fn heard_speech(&self) -> bool {
        self.state != UtteranceState::Waiting
    }

    /// Take the accumulated samples, resetting the detector
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let samples = std::mem::take(&mut self.speech_buffer);
        self.reset();
        samples
    }

    /// Reset to waiting
    pub fn reset(&mut self) {
        self.state = UtteranceState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }
}

/// Duration in seconds of `samples` at the capture rate
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_secs(samples: usize) -> f32 {
    samples as f32 / SAMPLE_RATE as f32
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
