//! Answer pipeline
//!
//! Resolves a transcript to an answer (cache first, then the NLU service),
//! shows it, and speaks it. One run at a time per pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Instrument;
use uuid::Uuid;

use crate::cache::AnswerStore;
use crate::nlu::{ChatRequest, NluClient};
use crate::speech::{self, Synthesizer};
use crate::surface::{NLU_ERROR_PREFIX, Surface};
use crate::{Error, Result};

/// What happens to answers fetched from the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Store every network answer under its transcript
    #[default]
    WriteThrough,
    /// Only read; entries are written by other means (e.g. `hark cache set`)
    ReadOnly,
}

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Cache,
    Network,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub answer: String,
    pub source: AnswerSource,
}

/// Context for resolving and speaking answers
///
/// Built once at startup and shared by reference with the dictation session.
pub struct AnswerPipeline {
    surface: Arc<dyn Surface>,
    nlu: Arc<dyn NluClient>,
    synthesizer: Arc<dyn Synthesizer>,
    cache: Option<Arc<dyn AnswerStore>>,
    policy: CachePolicy,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a run ends, however it ends
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AnswerPipeline {
    /// Create a pipeline without a cache
    #[must_use]
    pub fn new(
        surface: Arc<dyn Surface>,
        nlu: Arc<dyn NluClient>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            surface,
            nlu,
            synthesizer,
            cache: None,
            policy: CachePolicy::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Consult `store` before the network, writing back per `policy`
    #[must_use]
    pub fn with_cache(mut self, store: Arc<dyn AnswerStore>, policy: CachePolicy) -> Self {
        self.cache = Some(store);
        self.policy = policy;
        self
    }

    /// The display surface this pipeline writes to
    #[must_use]
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    /// Whether a run is currently outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("interaction already in flight, rejecting");
            return Err(Error::Busy);
        }
        Ok(FlightGuard(&self.in_flight))
    }

    /// Resolve `transcript` to an answer, display it, and speak it
    ///
    /// A cache hit skips the network entirely. On NLU failure the error is
    /// shown on the recognized-text sink and nothing is spoken.
    ///
    /// # Errors
    ///
    /// - `Error::Busy` if another run is outstanding (no sink is touched)
    /// - `Error::Nlu` if the service call fails
    /// - cache read errors, and synthesis errors
    pub async fn resolve_and_speak(&self, transcript: &str) -> Result<Resolution> {
        let _guard = self.begin()?;

        let span = tracing::info_span!("interaction", id = %Uuid::new_v4());
        self.run(transcript).instrument(span).await
    }

    async fn run(&self, transcript: &str) -> Result<Resolution> {
        self.surface.show_recognized("");
        self.surface.show_answer("");
        self.surface.show_recognized(transcript);

        let cached = match &self.cache {
            Some(store) => store.get(transcript)?,
            None => None,
        };

        let resolution = if let Some(answer) = cached {
            tracing::info!("answer served from cache");
            Resolution {
                answer,
                source: AnswerSource::Cache,
            }
        } else {
            let answer = match self.nlu.chat(&ChatRequest::new(transcript)).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(error = %e, "NLU processing failed");
                    self.surface
                        .show_recognized(&format!("{NLU_ERROR_PREFIX} {e}"));
                    return Err(e.into());
                }
            };
            self.remember(transcript, &answer);
            Resolution {
                answer,
                source: AnswerSource::Network,
            }
        };

        self.surface.show_answer(&resolution.answer);
        speech::say(self.synthesizer.as_ref(), &resolution.answer).await?;

        Ok(resolution)
    }

    /// Write a network answer back to the cache if the policy allows
    fn remember(&self, transcript: &str, answer: &str) {
        let Some(store) = &self.cache else {
            return;
        };
        if self.policy != CachePolicy::WriteThrough {
            return;
        }

        // Write failures are logged, not propagated
        if let Err(e) = store.set(transcript, answer) {
            tracing::warn!(error = %e, "failed to cache answer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_writes_through() {
        assert_eq!(CachePolicy::default(), CachePolicy::WriteThrough);
    }

    #[test]
    fn test_flight_guard_resets_flag() {
        let flag = AtomicBool::new(true);
        {
            let _guard = FlightGuard(&flag);
        }
        assert!(!flag.load(Ordering::SeqCst));
    }
}
