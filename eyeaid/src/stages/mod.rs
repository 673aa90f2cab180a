//! Inference stages.
//!
//! Each stage builds a fixed prompt, asks the oracle, and turns the answer
//! into a typed record. An [`OracleError`] never leaves a stage: it is
//! caught at the stage boundary and replaced by that stage's safety
//! fallback, so a stage always yields a record.

mod communication;
mod documentation;
pub mod prompt;
mod screening;
mod triage;

pub use communication::{CommunicationStage, COMMUNICATION_FALLBACK};
pub use documentation::DocumentationStage;
pub use screening::{ScreeningStage, SCREENING_FAILED};
pub use triage::{TriageStage, INFERENCE_FAILURE_ACTION};

use crate::config::GenerationParams;
use crate::core::StageName;
use crate::errors::OracleError;
use crate::extract::ExtractionPath;
use crate::oracle::{CompletionRequest, InferenceOracle};
use std::fmt::Debug;

/// A pipeline stage that consults the oracle.
pub trait Stage: Send + Sync + Debug {
    /// Which stage this is.
    fn name(&self) -> StageName;

    /// Sampling parameters for the stage's oracle call.
    fn params(&self) -> GenerationParams;

    /// A text request for `prompt` carrying this stage's parameters.
    fn request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest::text(prompt, self.params())
    }
}

/// What a stage produced and how.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome<T> {
    /// The stage's record, possibly a fallback or placeholder.
    pub record: T,
    /// Extraction phase for structured records; `None` for free text or
    /// when the oracle failed.
    pub extraction: Option<ExtractionPath>,
    /// The oracle failure that forced the safety fallback, if any.
    pub fallback: Option<OracleError>,
}

impl<T> StageOutcome<T> {
    /// An outcome built from oracle output.
    #[must_use]
    pub const fn answered(record: T, extraction: Option<ExtractionPath>) -> Self {
        Self {
            record,
            extraction,
            fallback: None,
        }
    }

    /// An outcome built from the safety fallback.
    #[must_use]
    pub const fn fell_back(record: T, error: OracleError) -> Self {
        Self {
            record,
            extraction: None,
            fallback: Some(error),
        }
    }

    /// Returns true if the safety fallback was used.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Returns true if the record did not come from a clean oracle answer.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.is_fallback() || self.extraction.is_some_and(|path| path.is_degraded())
    }
}

/// Drops a verbatim copy of the prompt that some backends prepend to the
/// generated text.
pub fn strip_echoed_prompt<'a>(raw: &'a str, prompt: &str) -> &'a str {
    let trimmed = raw.trim_start();
    match trimmed.strip_prefix(prompt.trim()) {
        Some(rest) if !prompt.trim().is_empty() => rest,
        _ => raw,
    }
}

/// Sends one request for a stage, mapping the answer or the failure.
pub(crate) async fn consult<S, T>(
    stage: &S,
    oracle: &dyn InferenceOracle,
    request: CompletionRequest,
    answer: impl FnOnce(&str) -> (T, Option<ExtractionPath>) + Send,
    fallback: impl FnOnce(&OracleError) -> T + Send,
) -> StageOutcome<T>
where
    S: Stage + ?Sized,
{
    let name = stage.name();
    tracing::debug!(
        stage = %name,
        prompt_chars = request.prompt.chars().count(),
        with_image = request.has_image(),
        max_new_tokens = request.params.max_new_tokens,
        "Consulting oracle"
    );

    match oracle.complete(&request).await {
        Ok(raw) => {
            let (record, extraction) = answer(strip_echoed_prompt(&raw, &request.prompt));
            if let Some(path) = extraction {
                tracing::debug!(stage = %name, extraction = %path, "Extracted structured output");
            }
            StageOutcome::answered(record, extraction)
        }
        Err(error) => {
            tracing::warn!(
                stage = %name,
                error = %error,
                error_kind = error.kind(),
                "Oracle call failed; using safety fallback"
            );
            let record = fallback(&error);
            StageOutcome::fell_back(record, error)
        }
    }
}
