//! Multimodal screening: describes visible retinal features.

use super::{consult, prompt, Stage, StageOutcome};
use crate::config::GenerationParams;
use crate::core::{PatientContext, ScreeningResult, StageName};
use crate::errors::OracleError;
use crate::extract::extract_with_path;
use crate::oracle::{ImageRef, InferenceOracle};

/// Assessment reported when the oracle call fails.
pub const SCREENING_FAILED: &str = "Screening failed due to local inference error";

/// The screening stage. The only stage that sends the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningStage {
    params: GenerationParams,
}

impl ScreeningStage {
    /// Creates the stage with the given sampling parameters.
    #[must_use]
    pub const fn new(params: GenerationParams) -> Self {
        Self { params }
    }

    /// Record used when the oracle fails.
    #[must_use]
    pub fn fallback(error: &OracleError) -> ScreeningResult {
        ScreeningResult {
            observations: Vec::new(),
            overall_assessment: SCREENING_FAILED.to_string(),
            uncertainty_notes: error.to_string(),
        }
    }

    /// Describes the image.
    pub async fn run(
        &self,
        oracle: &dyn InferenceOracle,
        patient: &PatientContext,
        image: &ImageRef,
    ) -> StageOutcome<ScreeningResult> {
        let request = self.request(prompt::screening(patient)).with_image(image.clone());

        consult(
            self,
            oracle,
            request,
            |raw| {
                let extraction = extract_with_path::<ScreeningResult>(raw);
                (extraction.record, Some(extraction.path))
            },
            Self::fallback,
        )
        .await
    }
}

impl Default for ScreeningStage {
    fn default() -> Self {
        Self::new(crate::config::StageGenerationParams::default().screening)
    }
}

impl Stage for ScreeningStage {
    fn name(&self) -> StageName {
        StageName::Screening
    }

    fn params(&self) -> GenerationParams {
        self.params
    }
}
