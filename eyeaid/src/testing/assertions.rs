//! Test assertions for pipeline outcomes.

use crate::core::{ClinicalNote, PatientMessage, PipelineOutcome, StageName, TriageLevel};

/// Asserts that the run completed every stage.
pub fn assert_completed(outcome: &PipelineOutcome) {
    assert!(
        outcome.is_completed(),
        "Expected a completed run, got status: {:?}",
        outcome.status()
    );
}

/// Asserts that the run was halted at `stage`.
pub fn assert_stopped_at(outcome: &PipelineOutcome, stage: StageName) {
    assert_eq!(
        outcome.stage_reached(),
        Some(stage),
        "Expected the run to stop at {stage}, got status: {:?}",
        outcome.status()
    );
}

/// Asserts the triage level of a completed run.
pub fn assert_triage_level(outcome: &PipelineOutcome, expected: TriageLevel) {
    let actual = outcome.triage().map(|triage| triage.level);
    assert_eq!(
        actual,
        Some(expected),
        "Expected triage level {expected}, got {actual:?}"
    );
}

/// Asserts that both texts of a completed run begin with their markers.
pub fn assert_texts_marked(outcome: &PipelineOutcome) {
    let note = outcome
        .clinical_documentation()
        .map(ClinicalNote::as_str)
        .unwrap_or_default();
    assert!(
        note.starts_with(ClinicalNote::MARKER),
        "Expected clinical documentation to begin with {:?}, got {note:?}",
        ClinicalNote::MARKER
    );

    let message = outcome
        .patient_communication()
        .map(PatientMessage::as_str)
        .unwrap_or_default();
    assert!(
        message.starts_with(PatientMessage::MARKER),
        "Expected patient communication to begin with {:?}, got {message:?}",
        PatientMessage::MARKER
    );
}

/// Asserts that the serialized outcome contains exactly `keys`.
pub fn assert_wire_keys(outcome: &PipelineOutcome, keys: &[&str]) {
    let value = outcome.to_json().unwrap_or_default();
    let mut actual: Vec<&str> = value
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();
    actual.sort_unstable();

    let mut expected = keys.to_vec();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Unexpected outcome keys");
}
