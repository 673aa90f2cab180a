//! Risk stratification from the screening record.

use super::{consult, prompt, Stage, StageOutcome};
use crate::config::GenerationParams;
use crate::core::{PatientContext, ScreeningResult, StageName, TriageLevel, TriageResult};
use crate::errors::OracleError;
use crate::extract::extract_with_path;
use crate::oracle::InferenceOracle;

/// Action recommended whenever triage could not be reasoned.
pub const INFERENCE_FAILURE_ACTION: &str = "Refer to specialist";

/// The triage stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriageStage {
    params: GenerationParams,
}

impl TriageStage {
    /// Creates the stage with the given sampling parameters.
    #[must_use]
    pub const fn new(params: GenerationParams) -> Self {
        Self { params }
    }

    /// Record used when the oracle fails. Always `high`, whatever the
    /// screening record says.
    #[must_use]
    pub fn fallback(error: &OracleError) -> TriageResult {
        TriageResult {
            level: TriageLevel::High,
            reasoning: format!("Local inference error: {error}"),
            recommended_action: INFERENCE_FAILURE_ACTION.to_string(),
        }
    }

    /// Stratifies risk.
    pub async fn run(
        &self,
        oracle: &dyn InferenceOracle,
        patient: &PatientContext,
        screening: &ScreeningResult,
    ) -> StageOutcome<TriageResult> {
        let request = self.request(prompt::triage(patient, screening));

        consult(
            self,
            oracle,
            request,
            |raw| {
                let extraction = extract_with_path::<TriageResult>(raw);
                (extraction.record, Some(extraction.path))
            },
            Self::fallback,
        )
        .await
    }
}

impl Default for TriageStage {
    fn default() -> Self {
        Self::new(crate::config::StageGenerationParams::default().triage)
    }
}

impl Stage for TriageStage {
    fn name(&self) -> StageName {
        StageName::Triage
    }

    fn params(&self) -> GenerationParams {
        self.params
    }
}
