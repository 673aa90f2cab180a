//! Clinician-facing screening note.

use super::{consult, prompt, Stage, StageOutcome};
use crate::config::GenerationParams;
use crate::core::{
    ClinicalNote, ImageQuality, IntakeResult, PatientContext, ScreeningResult, StageName,
    TriageResult,
};
use crate::extract::extract_section;
use crate::oracle::InferenceOracle;

/// The documentation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentationStage {
    params: GenerationParams,
}

impl DocumentationStage {
    /// Creates the stage with the given sampling parameters.
    #[must_use]
    pub const fn new(params: GenerationParams) -> Self {
        Self { params }
    }

    /// Note used when the oracle fails. Echoes the known image quality and
    /// asks for manual review.
    #[must_use]
    pub fn fallback(image_quality: ImageQuality) -> ClinicalNote {
        ClinicalNote::new(format!(
            "{} (System Generated Fallback)\n\
             - Patient Summary: Context available in patient data.\n\
             - Image Quality: {image_quality}\n\
             - Screening Observations: Automated screening failed due to local inference error.\n\
             - Triage Recommendation: HIGH RISK (Safety Fallback) - Please review manually.",
            ClinicalNote::MARKER
        ))
    }

    /// Writes the note.
    pub async fn run(
        &self,
        oracle: &dyn InferenceOracle,
        patient: &PatientContext,
        intake: &IntakeResult,
        screening: &ScreeningResult,
        triage: &TriageResult,
    ) -> StageOutcome<ClinicalNote> {
        let request = self.request(prompt::documentation(patient, intake, screening, triage));
        let quality = intake.image_quality;

        consult(
            self,
            oracle,
            request,
            |raw| (ClinicalNote::new(extract_section(raw, ClinicalNote::MARKER)), None),
            |_| Self::fallback(quality),
        )
        .await
    }
}

impl Default for DocumentationStage {
    fn default() -> Self {
        Self::new(crate::config::StageGenerationParams::default().documentation)
    }
}

impl Stage for DocumentationStage {
    fn name(&self) -> StageName {
        StageName::Documentation
    }

    fn params(&self) -> GenerationParams {
        self.params
    }
}
