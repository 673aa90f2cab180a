//! The single outcome produced by a pipeline run.

use super::{
    ClinicalNote, IntakeResult, PatientMessage, PipelineStatus, ScreeningResult, StageName,
    TriageResult,
};
use serde::{Deserialize, Serialize};

/// Outcome of one run.
///
/// A stopped run carries only the intake result, so downstream fields can
/// never be populated when the gate rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The run halted before any oracle call.
    Stopped {
        /// Stage at which the run halted.
        #[serde(rename = "stage")]
        stage_reached: StageName,
        /// The intake result explaining why.
        intake: IntakeResult,
    },
    /// Every stage produced a (possibly degraded) record.
    Completed {
        /// The intake result.
        intake: IntakeResult,
        /// Screening observations.
        screening: ScreeningResult,
        /// Triage decision.
        triage: TriageResult,
        /// Clinician-facing note.
        clinical_documentation: ClinicalNote,
        /// Patient-facing explanation.
        patient_communication: PatientMessage,
    },
}

impl PipelineOutcome {
    /// Creates a stopped outcome at the intake gate.
    #[must_use]
    pub const fn stopped_at_intake(intake: IntakeResult) -> Self {
        Self::Stopped {
            stage_reached: StageName::Intake,
            intake,
        }
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> PipelineStatus {
        match self {
            Self::Stopped { .. } => PipelineStatus::Stopped,
            Self::Completed { .. } => PipelineStatus::Completed,
        }
    }

    /// Returns true if every stage ran.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The stage the run halted at, present iff stopped.
    #[must_use]
    pub const fn stage_reached(&self) -> Option<StageName> {
        match self {
            Self::Stopped { stage_reached, .. } => Some(*stage_reached),
            Self::Completed { .. } => None,
        }
    }

    /// The intake result, present in every outcome.
    #[must_use]
    pub const fn intake(&self) -> &IntakeResult {
        match self {
            Self::Stopped { intake, .. } | Self::Completed { intake, .. } => intake,
        }
    }

    /// The screening result, if the run got that far.
    #[must_use]
    pub const fn screening(&self) -> Option<&ScreeningResult> {
        match self {
            Self::Completed { screening, .. } => Some(screening),
            Self::Stopped { .. } => None,
        }
    }

    /// The triage result, if the run got that far.
    #[must_use]
    pub const fn triage(&self) -> Option<&TriageResult> {
        match self {
            Self::Completed { triage, .. } => Some(triage),
            Self::Stopped { .. } => None,
        }
    }

    /// The clinician note, if the run completed.
    #[must_use]
    pub const fn clinical_documentation(&self) -> Option<&ClinicalNote> {
        match self {
            Self::Completed {
                clinical_documentation,
                ..
            } => Some(clinical_documentation),
            Self::Stopped { .. } => None,
        }
    }

    /// The patient message, if the run completed.
    #[must_use]
    pub const fn patient_communication(&self) -> Option<&PatientMessage> {
        match self {
            Self::Completed {
                patient_communication,
                ..
            } => Some(patient_communication),
            Self::Stopped { .. } => None,
        }
    }

    /// Serializes to the wire shape as a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
