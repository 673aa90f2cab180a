//! Stage names and pipeline status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stages of a screening run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Deterministic patient and image validation.
    Intake,
    /// Multimodal description of visible retinal features.
    Screening,
    /// Risk stratification.
    Triage,
    /// Clinician-facing note.
    Documentation,
    /// Patient-facing explanation.
    Communication,
}

impl StageName {
    /// Returns the wire name of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Screening => "screening",
            Self::Triage => "triage",
            Self::Documentation => "documentation",
            Self::Communication => "communication",
        }
    }

    /// Returns true if the stage calls the reasoning backend.
    #[must_use]
    pub const fn uses_oracle(&self) -> bool {
        !matches!(self, Self::Intake)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// The intake gate halted the run.
    Stopped,
    /// Every stage produced a record.
    Completed,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Completed => write!(f, "completed"),
        }
    }
}
