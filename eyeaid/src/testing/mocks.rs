//! Deterministic oracles for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::fixtures::{sample_screening, sample_triage};
use crate::core::{StageName, TriageLevel};
use crate::errors::OracleError;
use crate::oracle::{CompletionRequest, InferenceOracle};
use crate::stages::prompt::stage_of;

/// One call observed by a test oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The stage that issued the prompt, if recognised.
    pub stage: Option<StageName>,
    /// The prompt text.
    pub prompt: String,
    /// Whether an image was attached.
    pub had_image: bool,
}

/// An oracle that answers each stage with a canned response.
///
/// The stage is recognised from the prompt's role line. Any stage can be
/// made to fail, and every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: HashMap<StageName, String>,
    failures: HashMap<StageName, OracleError>,
    delay: Option<Duration>,
    serial: Option<tokio::sync::Mutex<()>>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedOracle {
    /// Creates an oracle with no scripted responses.
    ///
    /// Unscripted stages answer with an empty string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an oracle answering every stage with well-formed text.
    #[must_use]
    pub fn well_formed() -> Self {
        Self::new()
            .with_response(StageName::Screening, json_text(&sample_screening()))
            .with_response(
                StageName::Triage,
                json_text(&sample_triage(TriageLevel::Medium)),
            )
            .with_response(
                StageName::Documentation,
                "Screening Summary:\n\
                 - Patient Summary: 60 year old, no known conditions.\n\
                 - Image Quality: adequate\n\
                 - Screening Observations: Scattered microaneurysms.\n\
                 - Triage Recommendation: Medium, review within 3 months.",
            )
            .with_response(
                StageName::Communication,
                "Patient Explanation:\n\
                 Your retinal photo was clear enough to review. We noticed some small \
                 changes that are worth a closer look, so we recommend a follow-up visit.",
            )
    }

    /// Sets the response for a stage.
    #[must_use]
    pub fn with_response(mut self, stage: StageName, response: impl Into<String>) -> Self {
        self.responses.insert(stage, response.into());
        self
    }

    /// Makes a stage fail with the given error.
    #[must_use]
    pub fn failing_at(mut self, stage: StageName, error: OracleError) -> Self {
        self.failures.insert(stage, error);
        self
    }

    /// Delays every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serves one call at a time, holding an async lock across each call,
    /// like a backend with a single inference slot.
    #[must_use]
    pub fn serialized(mut self) -> Self {
        self.serial = Some(tokio::sync::Mutex::new(()));
        self
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns every recorded call in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the calls issued by one stage.
    #[must_use]
    pub fn calls_for(&self, stage: StageName) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.stage == Some(stage))
            .cloned()
            .collect()
    }

    /// Returns the largest number of calls that were in flight at once.
    #[must_use]
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceOracle for ScriptedOracle {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        let stage = stage_of(&request.prompt);
        self.calls.lock().push(RecordedCall {
            stage,
            prompt: request.prompt.clone(),
            had_image: request.has_image(),
        });

        let _slot = match &self.serial {
            Some(serial) => Some(serial.lock().await),
            None => None,
        };
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let Some(stage) = stage else {
            return Ok(String::new());
        };
        if let Some(error) = self.failures.get(&stage) {
            return Err(error.clone());
        }
        Ok(self.responses.get(&stage).cloned().unwrap_or_default())
    }
}

/// An oracle that fails every call.
#[derive(Debug)]
pub struct FailingOracle {
    error: OracleError,
    calls: AtomicUsize,
}

impl FailingOracle {
    /// Creates an oracle that always returns `error`.
    #[must_use]
    pub const fn new(error: OracleError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingOracle {
    fn default() -> Self {
        Self::new(OracleError::other("scripted failure"))
    }
}

#[async_trait]
impl InferenceOracle for FailingOracle {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

fn json_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
