//! Terminal synthesizer

use std::io::Write;

use async_trait::async_trait;

use super::Synthesizer;
use crate::Result;

/// "Speaks" by printing the utterance
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer;

impl ConsoleSynthesizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    fn cancel(&self) {}

    async fn speak(&self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "(speaking) {text}")?;
        out.flush()?;
        Ok(())
    }
}
