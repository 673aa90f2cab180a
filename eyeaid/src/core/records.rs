//! Per-stage result records.
//!
//! Every record here is created exactly once per run and never updated in
//! place. Field names match the wire shape consumed by presentation layers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Image quality bucket produced by the intake gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    /// No quality issues detected.
    Adequate,
    /// Exactly one quality issue.
    Marginal,
    /// Two or more issues, or the image could not be loaded.
    Poor,
}

impl ImageQuality {
    /// Buckets a number of detected issues.
    #[must_use]
    pub const fn from_issue_count(count: usize) -> Self {
        match count {
            0 => Self::Adequate,
            1 => Self::Marginal,
            _ => Self::Poor,
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adequate => write!(f, "adequate"),
            Self::Marginal => write!(f, "marginal"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

/// Result of the deterministic image checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageQualityReport {
    /// The quality bucket.
    pub quality: ImageQuality,
    /// Human-readable issues, in detection order.
    pub issues: Vec<String>,
}

impl ImageQualityReport {
    /// Builds a report from detected issues, bucketing by count.
    #[must_use]
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            quality: ImageQuality::from_issue_count(issues.len()),
            issues,
        }
    }

    /// Report for an image that could not be decoded.
    #[must_use]
    pub fn unreadable() -> Self {
        Self {
            quality: ImageQuality::Poor,
            issues: vec!["image could not be loaded".to_string()],
        }
    }
}

/// What the intake gate recommends doing next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeRecommendation {
    /// Inputs are usable.
    Proceed,
    /// Patient metadata is incomplete.
    CollectMoreInfo,
    /// The image must be captured again.
    RetakeImage,
}

impl fmt::Display for IntakeRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::CollectMoreInfo => write!(f, "collect_more_info"),
            Self::RetakeImage => write!(f, "retake_image"),
        }
    }
}

/// Output of the intake gate. Gates all downstream stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeResult {
    /// Whether downstream stages may run.
    pub input_valid: bool,
    /// The image quality bucket.
    pub image_quality: ImageQuality,
    /// Accumulated limitations, in the order they were found.
    pub limitations: Vec<String>,
    /// Recommended next step.
    pub recommendation: IntakeRecommendation,
}

/// One visible feature described by the screening stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningObservation {
    /// What was seen.
    pub feature: String,
    /// Where it was seen.
    pub location: String,
    /// Free-text confidence label.
    pub confidence: String,
}

impl ScreeningObservation {
    /// Creates a new observation.
    #[must_use]
    pub fn new(
        feature: impl Into<String>,
        location: impl Into<String>,
        confidence: impl Into<String>,
    ) -> Self {
        Self {
            feature: feature.into(),
            location: location.into(),
            confidence: confidence.into(),
        }
    }
}

/// Output of the screening stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Observations in the order reported.
    #[serde(default)]
    pub observations: Vec<ScreeningObservation>,
    /// Summary of the image.
    pub overall_assessment: String,
    /// Caveats about the observations.
    #[serde(default)]
    pub uncertainty_notes: String,
}

/// Ordinal risk bucket. Inference failure always maps to `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    /// Routine follow-up.
    Low,
    /// Timely review.
    Medium,
    /// Urgent referral.
    High,
}

impl TriageLevel {
    /// Parses a level leniently: case-insensitive, surrounding whitespace ignored.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for TriageLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::unknown_variant(&raw, &["low", "medium", "high"])
        })
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Output of the triage stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    /// Risk bucket.
    #[serde(rename = "triage_level")]
    pub level: TriageLevel,
    /// Why this level was chosen.
    pub reasoning: String,
    /// What should happen next.
    pub recommended_action: String,
}

macro_rules! marked_text {
    ($(#[$meta:meta])* $name:ident, $marker:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The section marker every text of this kind begins with.
            pub const MARKER: &'static str = $marker;

            /// Wraps text, prefixing the marker on its own line when the text
            /// does not already begin with it.
            #[must_use]
            pub fn new(text: impl Into<String>) -> Self {
                let text = text.into();
                let trimmed = text.trim();
                if trimmed.starts_with(Self::MARKER) {
                    Self(trimmed.to_string())
                } else {
                    Self(format!("{}\n{}", Self::MARKER, trimmed))
                }
            }

            /// The full text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

marked_text!(
    /// Clinician-facing screening note.
    ClinicalNote,
    "Screening Summary:"
);

marked_text!(
    /// Patient-facing explanation.
    PatientMessage,
    "Patient Explanation:"
);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quality_bucketing() {
        assert_eq!(ImageQuality::from_issue_count(0), ImageQuality::Adequate);
        assert_eq!(ImageQuality::from_issue_count(1), ImageQuality::Marginal);
        assert_eq!(ImageQuality::from_issue_count(2), ImageQuality::Poor);
        assert_eq!(ImageQuality::from_issue_count(7), ImageQuality::Poor);
    }

    #[test]
    fn test_intake_result_wire_shape() {
        let intake = IntakeResult {
            input_valid: false,
            image_quality: ImageQuality::Poor,
            limitations: vec!["low resolution".to_string()],
            recommendation: IntakeRecommendation::RetakeImage,
        };

        let value = serde_json::to_value(&intake).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "input_valid": false,
                "image_quality": "poor",
                "limitations": ["low resolution"],
                "recommendation": "retake_image",
            })
        );
    }

    #[test]
    fn test_triage_level_lenient_parse() {
        let triage: TriageResult = serde_json::from_str(
            r#"{"triage_level":" Medium ","reasoning":"r","recommended_action":"a"}"#,
        )
        .unwrap();
        assert_eq!(triage.level, TriageLevel::Medium);

        let bad = serde_json::from_str::<TriageResult>(
            r#"{"triage_level":"moderate","reasoning":"r","recommended_action":"a"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_triage_level_ordering() {
        assert!(TriageLevel::High > TriageLevel::Medium);
        assert!(TriageLevel::Medium > TriageLevel::Low);
    }

    #[test]
    fn test_screening_defaults() {
        let screening: ScreeningResult =
            serde_json::from_str(r#"{"overall_assessment":"clear view"}"#).unwrap();

        assert!(screening.observations.is_empty());
        assert_eq!(screening.uncertainty_notes, "");
    }

    #[test]
    fn test_screening_requires_assessment() {
        let result = serde_json::from_str::<ScreeningResult>(r#"{"observations":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_marked_text_prefixes_missing_marker() {
        let note = ClinicalNote::new("  - Patient Summary: 60 years\n");
        assert_eq!(note.as_str(), "Screening Summary:\n- Patient Summary: 60 years");

        let message = PatientMessage::new("Patient Explanation: all good");
        assert_eq!(message.as_str(), "Patient Explanation: all good");
    }

    #[test]
    fn test_marked_text_serializes_as_string() {
        let note = ClinicalNote::new("Screening Summary: ok");
        assert_eq!(serde_json::to_string(&note).unwrap(), r#""Screening Summary: ok""#);
    }
}
