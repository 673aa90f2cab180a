//! # EyeAid
//!
//! Fail-safe orchestration of an agentic retinal screening pipeline.
//!
//! A run takes patient metadata and one retinal fundus image through five
//! stages:
//!
//! - **Intake**: deterministic patient-field and image-quality gate
//! - **Screening**: multimodal description of visible features
//! - **Triage**: risk stratification into low, medium or high
//! - **Documentation**: a clinician-facing note
//! - **Communication**: a patient-facing explanation
//!
//! Every inference stage talks to an abstract [`oracle::InferenceOracle`].
//! Oracle failures never escape a stage; each stage substitutes a
//! safety-biased fallback, and triage always falls back to `high`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eyeaid::prelude::*;
//! use std::sync::Arc;
//!
//! let oracle = Arc::new(HttpOracle::from_env()?);
//! let pipeline = PipelineOrchestrator::builder().oracle(oracle).build()?;
//!
//! let patient = PatientContext::new(60).with_condition("diabetes");
//! let outcome = pipeline.run(&patient, &ImageRef::path("fundus.jpg")).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod extract;
pub mod intake;
pub mod oracle;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        GenerationParams, IntakeConfig, OracleConfig, PipelineConfig, StageGenerationParams,
    };
    pub use crate::core::{
        ClinicalNote, ImageQuality, IntakeRecommendation, IntakeResult, PatientContext,
        PatientMessage, PipelineOutcome, PipelineStatus, ScreeningObservation, ScreeningResult,
        StageName, TriageLevel, TriageResult,
    };
    pub use crate::errors::{ConfigError, EyeaidError, ImageError, OracleError};
    pub use crate::events::{
        CollectingEventSink, EventKind, EventSink, LoggingEventSink, NoOpEventSink,
        PipelineEvent,
    };
    pub use crate::extract::{extract_section, extract_structured, Extractable};
    pub use crate::intake::IntakeGate;
    #[cfg(feature = "http")]
    pub use crate::oracle::HttpOracle;
    pub use crate::oracle::{CompletionRequest, ImageRef, InferenceOracle};
    pub use crate::pipeline::{PipelineOrchestrator, PipelineOrchestratorBuilder};
}
