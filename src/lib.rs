//! Hark - voice assistant front end
//!
//! Captures an utterance, asks a remote NLU service for an answer (or finds
//! it in the local answer cache), shows the answer, and speaks it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐  transcript  ┌──────────────────────────────┐
//! │      Dictation      │─────────────▶│        Answer pipeline       │
//! │ Recognizer + machine│              │  cache ──miss──▶ NLU service │
//! └──────────┬──────────┘              └───────┬──────────────┬───────┘
//!            │ label                           │ text         │ answer
//!            ▼                                 ▼              ▼
//!       ┌───────────────────────────────────────────┐  ┌─────────────┐
//!       │                  Surface                  │  │ Synthesizer │
//!       └───────────────────────────────────────────┘  └─────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod db;
pub mod dictation;
pub mod error;
pub mod nlu;
pub mod pipeline;
pub mod session;
pub mod speech;
pub mod surface;
pub mod voice;

pub use cache::{AnswerStore, CacheEntry, MemoryStore};
pub use config::Config;
pub use db::{AnswerRepo, DbPool};
pub use dictation::{
    CaptureAction, CaptureEvent, CaptureOptions, CaptureState, DictationMachine,
    KeyboardRecognizer, MicrophoneRecognizer, Recognizer,
};
pub use error::{Error, Result};
pub use nlu::{ChatRequest, ChatResponse, HttpNluClient, NluClient, NluError};
pub use pipeline::{AnswerPipeline, AnswerSource, CachePolicy, Resolution};
pub use session::Session;
pub use speech::{ConsoleSynthesizer, SpeakerSynthesizer, Synthesizer};
pub use surface::{Surface, TerminalSurface};
