//! Core domain model types for eyeaid.
//!
//! This module contains the records exchanged between pipeline stages:
//! - Patient context supplied by the caller
//! - Intake, screening and triage results
//! - Clinician and patient facing texts
//! - The final pipeline outcome

mod outcome;
mod patient;
mod records;
mod status;

pub use outcome::PipelineOutcome;
pub use patient::PatientContext;
pub use records::{
    ClinicalNote, ImageQuality, ImageQualityReport, IntakeRecommendation, IntakeResult,
    PatientMessage, ScreeningObservation, ScreeningResult, TriageLevel, TriageResult,
};
pub use status::{PipelineStatus, StageName};
