//! Patient-facing explanation.

use super::{consult, prompt, Stage, StageOutcome};
use crate::config::GenerationParams;
use crate::core::{PatientContext, PatientMessage, ScreeningResult, StageName, TriageResult};
use crate::extract::extract_section;
use crate::oracle::InferenceOracle;

/// Message used when the oracle fails.
pub const COMMUNICATION_FALLBACK: &str = "Patient Explanation:\n\
    We are currently experiencing technical difficulties with our automated analysis system. \
    However, your images have been safely captured. \
    Please consult with your healthcare provider for a manual review of your screening results.";

/// The communication stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunicationStage {
    params: GenerationParams,
}

impl CommunicationStage {
    /// Creates the stage with the given sampling parameters.
    #[must_use]
    pub const fn new(params: GenerationParams) -> Self {
        Self { params }
    }

    /// Message used when the oracle fails.
    #[must_use]
    pub fn fallback() -> PatientMessage {
        PatientMessage::new(COMMUNICATION_FALLBACK)
    }

    /// Writes the explanation.
    pub async fn run(
        &self,
        oracle: &dyn InferenceOracle,
        patient: &PatientContext,
        screening: &ScreeningResult,
        triage: &TriageResult,
    ) -> StageOutcome<PatientMessage> {
        let request = self.request(prompt::communication(patient, screening, triage));

        consult(
            self,
            oracle,
            request,
            |raw| (PatientMessage::new(extract_section(raw, PatientMessage::MARKER)), None),
            |_| Self::fallback(),
        )
        .await
    }
}

impl Default for CommunicationStage {
    fn default() -> Self {
        Self::new(crate::config::StageGenerationParams::default().communication)
    }
}

impl Stage for CommunicationStage {
    fn name(&self) -> StageName {
        StageName::Communication
    }

    fn params(&self) -> GenerationParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TriageLevel;
    use crate::errors::OracleError;
    use crate::oracle::MockInferenceOracle;
    use pretty_assertions::assert_eq;

    fn screening() -> ScreeningResult {
        ScreeningResult {
            observations: Vec::new(),
            overall_assessment: "clear".to_string(),
            uncertainty_notes: String::new(),
        }
    }

    fn triage() -> TriageResult {
        TriageResult {
            level: TriageLevel::Low,
            reasoning: "clear".to_string(),
            recommended_action: "routine".to_string(),
        }
    }

    #[tokio::test]
    async fn test_keeps_last_marker_section() {
        let mut oracle = MockInferenceOracle::new();
        oracle
            .expect_complete()
            .withf(|request| request.params.temperature > 0.25 && request.params.max_new_tokens == 300)
            .returning(|_| {
                Ok("Output format:\nPatient Explanation:\n... \n\nPatient Explanation:\nYour eyes look healthy.".to_string())
            });

        let outcome = CommunicationStage::default()
            .run(&oracle, &PatientContext::new(60), &screening(), &triage())
            .await;

        assert_eq!(
            outcome.record.as_str(),
            "Patient Explanation:\nYour eyes look healthy."
        );
    }

    #[tokio::test]
    async fn test_fallback_message() {
        let mut oracle = MockInferenceOracle::new();
        oracle
            .expect_complete()
            .returning(|_| Err(OracleError::backend(500, "internal")));

        let outcome = CommunicationStage::default()
            .run(&oracle, &PatientContext::new(60), &screening(), &triage())
            .await;

        assert!(outcome.is_fallback());
        assert_eq!(outcome.record.as_str(), COMMUNICATION_FALLBACK);
        assert!(outcome.record.as_str().starts_with(PatientMessage::MARKER));
    }
}
