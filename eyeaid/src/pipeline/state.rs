//! The run state machine.
//!
//! `Intake -> (Halted | Screening) -> Triage -> Reporting -> Completed`.
//! Reporting runs documentation and communication together. No transition
//! is reversible.

use crate::core::StageName;
use std::fmt;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Validating patient fields and image quality.
    Intake,
    /// The gate rejected the input. Terminal.
    Halted,
    /// Describing the image.
    Screening,
    /// Stratifying risk.
    Triage,
    /// Writing the clinician note and the patient explanation.
    Reporting,
    /// Every stage produced a record. Terminal.
    Completed,
}

impl PipelineState {
    /// The state a run enters once the intake gate has decided.
    #[must_use]
    pub const fn after_intake(input_valid: bool) -> Self {
        if input_valid {
            Self::Screening
        } else {
            Self::Halted
        }
    }

    /// The unconditional successor of an inference state.
    ///
    /// `Intake` has no unconditional successor, see [`Self::after_intake`].
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Screening => Some(Self::Triage),
            Self::Triage => Some(Self::Reporting),
            Self::Reporting => Some(Self::Completed),
            Self::Intake | Self::Halted | Self::Completed => None,
        }
    }

    /// Returns true if `to` directly follows this state.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        match self {
            Self::Intake => matches!(to, Self::Halted | Self::Screening),
            _ => self.next() == Some(to),
        }
    }

    /// Returns true for `Halted` and `Completed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted | Self::Completed)
    }

    /// The stages executed in this state.
    #[must_use]
    pub const fn stages(self) -> &'static [StageName] {
        match self {
            Self::Intake => &[StageName::Intake],
            Self::Screening => &[StageName::Screening],
            Self::Triage => &[StageName::Triage],
            Self::Reporting => &[StageName::Documentation, StageName::Communication],
            Self::Halted | Self::Completed => &[],
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intake => write!(f, "intake"),
            Self::Halted => write!(f, "halted"),
            Self::Screening => write!(f, "screening"),
            Self::Triage => write!(f, "triage"),
            Self::Reporting => write!(f, "reporting"),
            Self::Completed => write!(f, "completed"),
        }
    }
}
