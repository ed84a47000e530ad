//! Typed-line recognizer
//!
//! Stands in for a speech engine on terminals: the "utterance" is one line
//! read from stdin.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CaptureEvent, CaptureOptions, Recognizer};

/// Reads one line of stdin per capture session
#[derive(Debug, Default)]
pub struct KeyboardRecognizer {
    closed: AtomicBool,
}

impl KeyboardRecognizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Recognizer for KeyboardRecognizer {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn is_exhausted(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn listen(&self, _options: &CaptureOptions, events: mpsc::Sender<CaptureEvent>) {
        let _ = events.send(CaptureEvent::Started).await;

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|n| (n, line))
        })
        .await;

        match line {
            Ok(Ok((0, _))) => {
                tracing::debug!("stdin closed");
                self.closed.store(true, Ordering::SeqCst);
            }
            Ok(Ok((_, line))) => {
                let transcript = line.trim_end_matches(['\r', '\n']);
                if !transcript.trim().is_empty() {
                    let _ = events
                        .send(CaptureEvent::Result(transcript.to_string()))
                        .await;
                }
            }
            Ok(Err(e)) => {
                let _ = events.send(CaptureEvent::Error(e.to_string())).await;
            }
            Err(e) => {
                let _ = events.send(CaptureEvent::Error(e.to_string())).await;
            }
        }

        let _ = events.send(CaptureEvent::Ended).await;
    }
}
