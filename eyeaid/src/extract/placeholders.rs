//! Degraded records returned when oracle output cannot be parsed.

use super::Extractable;
use crate::core::{ScreeningObservation, ScreeningResult, TriageLevel, TriageResult};

/// Number of raw-output characters echoed into a placeholder.
pub const SNIPPET_CHARS: usize = 100;

/// Assessment used by the screening placeholder.
pub const SCREENING_PARSE_FAILURE: &str = "Could not parse model output (JSON not found)";

/// Reasoning used by the triage placeholder.
pub const TRIAGE_PARSE_FAILURE_REASONING: &str = "Parsing failure: could not read triage output";

/// Action used by the triage placeholder.
pub const TRIAGE_PARSE_FAILURE_ACTION: &str = "Refer to specialist";

fn snippet(raw: &str) -> String {
    raw.chars().take(SNIPPET_CHARS).collect()
}

impl Extractable for ScreeningResult {
    fn placeholder(raw: &str) -> Self {
        Self {
            observations: vec![ScreeningObservation::new("processing_error", "unknown", "low")],
            overall_assessment: SCREENING_PARSE_FAILURE.to_string(),
            uncertainty_notes: format!("Raw output snippet: {}...", snippet(raw)),
        }
    }
}

impl Extractable for TriageResult {
    fn placeholder(_raw: &str) -> Self {
        Self {
            level: TriageLevel::High,
            reasoning: TRIAGE_PARSE_FAILURE_REASONING.to_string(),
            recommended_action: TRIAGE_PARSE_FAILURE_ACTION.to_string(),
        }
    }
}
