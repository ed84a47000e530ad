//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hark::{
    AnswerPipeline, CaptureEvent, CaptureOptions, ChatRequest, DbPool, NluClient, NluError,
    Recognizer, Surface, Synthesizer, db,
};
use tokio::sync::mpsc;

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// One call made against a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Recognized(String),
    Answer(String),
    Label(String),
    Disabled,
}

/// Surface that records every call
#[derive(Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last value written to the recognized-text sink
    pub fn recognized(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            SurfaceCall::Recognized(text) => Some(text),
            _ => None,
        })
    }

    /// Last value written to the answer sink
    pub fn answer(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            SurfaceCall::Answer(text) => Some(text),
            _ => None,
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Label(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Surface for RecordingSurface {
    fn show_recognized(&self, text: &str) {
        self.push(SurfaceCall::Recognized(text.to_string()));
    }

    fn show_answer(&self, text: &str) {
        self.push(SurfaceCall::Answer(text.to_string()));
    }

    fn set_label(&self, label: &str) {
        self.push(SurfaceCall::Label(label.to_string()));
    }

    fn disable_trigger(&self) {
        self.push(SurfaceCall::Disabled);
    }
}

/// What a scripted NLU client answers with
#[derive(Debug, Clone)]
pub enum Reply {
    Answer(String),
    Transport(String),
    MissingOutput,
}

/// NLU client with a fixed reply that records every request
pub struct ScriptedNlu {
    reply: Reply,
    delay: Option<std::time::Duration>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedNlu {
    pub fn answering(answer: &str) -> Self {
        Self::with_reply(Reply::Answer(answer.to_string()))
    }

    pub fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold each reply for `delay` before returning it
    #[must_use]
    pub fn slow(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NluClient for ScriptedNlu {
    async fn chat(&self, request: &ChatRequest) -> Result<String, NluError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Reply::Answer(answer) => Ok(answer.clone()),
            Reply::Transport(detail) => Err(NluError::Transport(detail.clone())),
            Reply::MissingOutput => Err(NluError::MissingOutput),
        }
    }

    async fn status(&self) -> Result<String, NluError> {
        Ok("ok".to_string())
    }
}

/// One call made against a synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCall {
    Cancel,
    Speak(String),
}

/// Synthesizer that records cancel/speak order
#[derive(Default)]
pub struct RecordingSynthesizer {
    calls: Mutex<Vec<SpeechCall>>,
}

impl RecordingSynthesizer {
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SpeechCall::Speak(text) => Some(text),
                SpeechCall::Cancel => None,
            })
            .collect()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    fn cancel(&self) {
        self.calls.lock().unwrap().push(SpeechCall::Cancel);
    }

    async fn speak(&self, text: &str) -> hark::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SpeechCall::Speak(text.to_string()));
        Ok(())
    }
}

/// Recognizer that replays queued event scripts, one per session
pub struct ScriptedRecognizer {
    supported: bool,
    scripts: Mutex<VecDeque<Vec<CaptureEvent>>>,
    sessions: Mutex<usize>,
}

impl ScriptedRecognizer {
    pub fn new(scripts: Vec<Vec<CaptureEvent>>) -> Self {
        Self {
            supported: true,
            scripts: Mutex::new(scripts.into()),
            sessions: Mutex::new(0),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            scripts: Mutex::new(VecDeque::new()),
            sessions: Mutex::new(0),
        }
    }

    /// A session that hears `transcript`
    pub fn hearing(transcript: &str) -> Self {
        Self::new(vec![vec![
            CaptureEvent::Started,
            CaptureEvent::Result(transcript.to_string()),
            CaptureEvent::Ended,
        ]])
    }

    pub fn sessions(&self) -> usize {
        *self.sessions.lock().unwrap()
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn is_exhausted(&self) -> bool {
        self.scripts.lock().unwrap().is_empty()
    }

    async fn listen(&self, _options: &CaptureOptions, events: mpsc::Sender<CaptureEvent>) {
        *self.sessions.lock().unwrap() += 1;
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        for event in script {
            if events.send(event).await.is_err() {
                break;
            }
        }
    }
}

/// Collaborators wired into one pipeline, kept for inspection
pub struct Harness {
    pub surface: Arc<RecordingSurface>,
    pub nlu: Arc<ScriptedNlu>,
    pub synthesizer: Arc<RecordingSynthesizer>,
}

impl Harness {
    pub fn new(nlu: ScriptedNlu) -> Self {
        Self {
            surface: Arc::new(RecordingSurface::default()),
            nlu: Arc::new(nlu),
            synthesizer: Arc::new(RecordingSynthesizer::default()),
        }
    }

    /// Pipeline without a cache
    pub fn pipeline(&self) -> AnswerPipeline {
        AnswerPipeline::new(
            self.surface.clone(),
            self.nlu.clone(),
            self.synthesizer.clone(),
        )
    }
}
