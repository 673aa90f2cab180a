//! Structured-output extraction from free-form oracle text.
//!
//! Pure functions only. Nothing here returns an error: malformed output
//! degrades to a well-shaped placeholder record.
//!
//! Structured records go through two phases:
//! 1. strict parse of the whole text;
//! 2. parse of the first outer balanced `{...}` region.
//!
//! If both fail the record type's [`Extractable::placeholder`] is returned.

mod placeholders;
mod scan;

pub use placeholders::{
    SCREENING_PARSE_FAILURE, SNIPPET_CHARS, TRIAGE_PARSE_FAILURE_ACTION,
    TRIAGE_PARSE_FAILURE_REASONING,
};
pub use scan::find_balanced_object;

use serde::de::DeserializeOwned;
use std::fmt;

/// A record that can be pulled out of oracle text.
pub trait Extractable: DeserializeOwned {
    /// The degraded record used when no valid record is found.
    fn placeholder(raw: &str) -> Self;
}

/// Which phase produced an extracted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionPath {
    /// The whole text parsed.
    Strict,
    /// The first balanced brace region parsed.
    BraceScan,
    /// Neither phase parsed; the placeholder was used.
    Placeholder,
}

impl ExtractionPath {
    /// Returns true if the record is a degraded placeholder.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::BraceScan => write!(f, "brace_scan"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// An extracted record and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    /// The record.
    pub record: T,
    /// The phase that produced it.
    pub path: ExtractionPath,
}

/// Extracts a record, reporting which phase succeeded.
pub fn extract_with_path<T: Extractable>(raw: &str) -> Extraction<T> {
    if let Ok(record) = serde_json::from_str::<T>(raw) {
        return Extraction {
            record,
            path: ExtractionPath::Strict,
        };
    }

    if let Some(region) = find_balanced_object(raw) {
        if let Ok(record) = serde_json::from_str::<T>(region) {
            return Extraction {
                record,
                path: ExtractionPath::BraceScan,
            };
        }
    }

    Extraction {
        record: T::placeholder(raw),
        path: ExtractionPath::Placeholder,
    }
}

/// Extracts a record from oracle text, degrading to its placeholder.
pub fn extract_structured<T: Extractable>(raw: &str) -> T {
    extract_with_path(raw).record
}

/// Returns the trimmed text from the last occurrence of `marker` to the end.
///
/// If `marker` does not occur, the whole text is returned trimmed. Used to
/// drop an echoed prompt that precedes the model's answer.
pub fn extract_section<'a>(raw: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return raw.trim();
    }
    raw.rfind(marker)
        .map_or_else(|| raw.trim(), |start| raw[start..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ScreeningObservation, ScreeningResult, TriageLevel, TriageResult};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strict_parse() {
        let raw = r#"{"observations":[{"feature":"drusen","location":"macula","confidence":"high"}],"overall_assessment":"drusen seen","uncertainty_notes":"none"}"#;
        let extraction = extract_with_path::<ScreeningResult>(raw);

        assert_eq!(extraction.path, ExtractionPath::Strict);
        assert_eq!(
            extraction.record.observations,
            vec![ScreeningObservation::new("drusen", "macula", "high")]
        );
    }

    #[test]
    fn test_embedded_triage_record() {
        let raw = r#"prefix {"triage_level":"low","reasoning":"ok","recommended_action":"none"} suffix"#;
        let extraction = extract_with_path::<TriageResult>(raw);

        assert_eq!(extraction.path, ExtractionPath::BraceScan);
        assert_eq!(
            extraction.record,
            TriageResult {
                level: TriageLevel::Low,
                reasoning: "ok".to_string(),
                recommended_action: "none".to_string(),
            }
        );
    }

    #[test]
    fn test_unmatched_brace_before_record() {
        let raw = r#"Using the { schema you gave: {"triage_level":"low","reasoning":"ok","recommended_action":"none"}"#;
        let extraction = extract_with_path::<TriageResult>(raw);

        assert_eq!(extraction.path, ExtractionPath::BraceScan);
        assert_eq!(extraction.record.level, TriageLevel::Low);

        let screening: ScreeningResult = extract_structured(
            r#"Using the { schema you gave: {"observations":[],"overall_assessment":"clear"}"#,
        );
        assert_eq!(screening.overall_assessment, "clear");
    }

    #[test]
    fn test_unstructured_text_yields_screening_placeholder() {
        let screening: ScreeningResult = extract_structured("not structured data at all");

        assert!(screening.overall_assessment.contains("Could not parse"));
        assert_eq!(screening.observations.len(), 1);
        assert_eq!(screening.observations[0].feature, "processing_error");
        assert_eq!(screening.observations[0].location, "unknown");
        assert_eq!(screening.observations[0].confidence, "low");
        assert!(screening.uncertainty_notes.contains("not structured data at all"));
    }

    #[test]
    fn test_invalid_embedded_region_yields_placeholder() {
        let extraction = extract_with_path::<ScreeningResult>("answer: {\"observations\": oops}");
        assert_eq!(extraction.path, ExtractionPath::Placeholder);
        assert!(extraction.path.is_degraded());
    }

    #[test]
    fn test_unparseable_triage_is_high() {
        let triage: TriageResult = extract_structured("I think it is fine.");
        assert_eq!(triage.level, TriageLevel::High);
        assert_eq!(triage.recommended_action, TRIAGE_PARSE_FAILURE_ACTION);
    }

    #[test]
    fn test_unknown_triage_level_is_high() {
        let triage: TriageResult = extract_structured(
            r#"{"triage_level":"moderate","reasoning":"r","recommended_action":"a"}"#,
        );
        assert_eq!(triage.level, TriageLevel::High);
    }

    #[test]
    fn test_screening_round_trip() {
        let screening = ScreeningResult {
            observations: vec![
                ScreeningObservation::new("microaneurysms", "temporal arcade", "medium"),
                ScreeningObservation::new("hard exudates", "macula", "low"),
            ],
            overall_assessment: "Findings suggest follow-up".to_string(),
            uncertainty_notes: "Peripheral retina not visible".to_string(),
        };

        let text = serde_json::to_string(&screening).unwrap();
        let parsed: ScreeningResult = extract_structured(&text);
        assert_eq!(parsed, screening);

        let again: ScreeningResult = extract_structured(&serde_json::to_string(&parsed).unwrap());
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_section_uses_last_marker() {
        let raw = "You are an agent.\nOutput format:\nScreening Summary:\n- ...\n\nScreening Summary:\n- Patient Summary: 60y\n  ";
        assert_eq!(
            extract_section(raw, "Screening Summary:"),
            "Screening Summary:\n- Patient Summary: 60y"
        );
    }

    #[test]
    fn test_section_without_marker_is_trimmed_text() {
        assert_eq!(
            extract_section("  plain answer \n", "Patient Explanation:"),
            "plain answer"
        );
    }
}
