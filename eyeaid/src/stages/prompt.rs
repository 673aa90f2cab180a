//! Fixed prompt templates for the inference stages.
//!
//! Upstream records are embedded as compact JSON in declared field order:
//! patient, intake, screening, triage.

use crate::core::{
    ClinicalNote, IntakeResult, PatientContext, PatientMessage, ScreeningResult, StageName,
    TriageResult,
};
use serde::Serialize;

/// Role line of the screening prompt.
pub const SCREENING_ROLE: &str = "You are an Ophthalmic Screening Agent.";
/// Role line of the triage prompt.
pub const TRIAGE_ROLE: &str = "You are a Risk Stratification and Triage Agent.";
/// Role line of the documentation prompt.
pub const DOCUMENTATION_ROLE: &str = "You are a Clinical Documentation Agent.";
/// Role line of the communication prompt.
pub const COMMUNICATION_ROLE: &str = "You are a Patient Communication Agent.";

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Prompt for the multimodal screening call.
#[must_use]
pub fn screening(patient: &PatientContext) -> String {
    format!(
        "{SCREENING_ROLE}\n\
         Analyze the retinal fundus image and return a JSON object with observations.\n\n\
         Rules:\n\
         - Do NOT diagnose\n\
         - Describe visible features\n\
         - Provide confidence levels\n\n\
         Output Format (JSON):\n\
         {{\n  \
         \"observations\": [{{\"feature\": \"...\", \"location\": \"...\", \"confidence\": \"...\"}}],\n  \
         \"overall_assessment\": \"...\",\n  \
         \"uncertainty_notes\": \"...\"\n\
         }}\n\
         Patient context: {}",
        patient.to_prompt_json()
    )
}

/// Prompt for the triage call.
#[must_use]
pub fn triage(patient: &PatientContext, screening: &ScreeningResult) -> String {
    format!(
        "{TRIAGE_ROLE}\n\
         Based on the inputs, recommend a triage level (low, medium, high).\n\n\
         Return STRICT JSON:\n\
         {{\n  \
         \"triage_level\": \"...\",\n  \
         \"reasoning\": \"...\",\n  \
         \"recommended_action\": \"...\"\n\
         }}\n\n\
         Patient context: {}\n\
         Screening observations: {}",
        patient.to_prompt_json(),
        json(screening)
    )
}

/// Prompt for the clinician-facing note.
#[must_use]
pub fn documentation(
    patient: &PatientContext,
    intake: &IntakeResult,
    screening: &ScreeningResult,
    triage: &TriageResult,
) -> String {
    format!(
        "{DOCUMENTATION_ROLE}\n\
         Generate structured ophthalmic screening notes.\n\n\
         Output format:\n\
         {}\n\
         - Patient Summary:\n\
         - Image Quality:\n\
         - Screening Observations:\n\
         - Triage Recommendation:\n\n\
         Provide the content for these sections based on the inputs below:\n\
         Patient context: {}\n\
         Intake & image quality: {}\n\
         Screening findings: {}\n\
         Triage decision: {}",
        ClinicalNote::MARKER,
        patient.to_prompt_json(),
        json(intake),
        json(screening),
        json(triage)
    )
}

/// Prompt for the patient-facing explanation.
#[must_use]
pub fn communication(
    patient: &PatientContext,
    screening: &ScreeningResult,
    triage: &TriageResult,
) -> String {
    format!(
        "{COMMUNICATION_ROLE}\n\
         Explain the results to the patient in simple, reassuring language.\n\n\
         Output format:\n\
         {}\n\
         ... (2-3 paragraphs)\n\n\
         Patient context: {}\n\
         Screening findings: {}\n\
         Triage recommendation: {}",
        PatientMessage::MARKER,
        patient.to_prompt_json(),
        json(screening),
        json(triage)
    )
}

/// Identifies which stage built a prompt from its role line.
#[must_use]
pub fn stage_of(prompt: &str) -> Option<StageName> {
    let prompt = prompt.trim_start();
    [
        (SCREENING_ROLE, StageName::Screening),
        (TRIAGE_ROLE, StageName::Triage),
        (DOCUMENTATION_ROLE, StageName::Documentation),
        (COMMUNICATION_ROLE, StageName::Communication),
    ]
    .into_iter()
    .find_map(|(role, stage)| prompt.starts_with(role).then_some(stage))
}
