//! Desktop audio plumbing
//!
//! Microphone capture, end-of-utterance detection, Whisper STT, OpenAI TTS,
//! and speaker playback.

mod capture;
mod playback;
mod stt;
mod tts;
mod utterance;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, PlaybackHandle, decode_mp3};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use utterance::{UtteranceDetector, UtteranceState, duration_secs};
