//! Deterministic intake gate.
//!
//! Validates patient metadata and image quality before any inference is
//! spent on the run. The gate never calls the oracle and never fails: every
//! problem becomes a limitation and a recommendation.

mod quality;

pub use quality::{
    assess, check_image, laplacian_variance, load_image, to_grayscale, BLURRY, LOW_RESOLUTION,
};

use crate::config::IntakeConfig;
use crate::core::{
    ImageQuality, ImageQualityReport, IntakeRecommendation, IntakeResult, PatientContext,
};
use crate::oracle::ImageRef;

/// Outcome of the patient metadata check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFieldCheck {
    /// Required fields that are absent.
    pub missing: Vec<&'static str>,
    /// Required fields that are present but unusable.
    pub invalid: Vec<&'static str>,
}

impl PatientFieldCheck {
    /// Returns true if nothing is missing or invalid.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

/// The intake and image quality gate.
#[derive(Debug, Clone, Default)]
pub struct IntakeGate {
    config: IntakeConfig,
}

impl IntakeGate {
    /// Creates a gate with the given thresholds.
    #[must_use]
    pub const fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    /// Returns the thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Checks required patient fields.
    #[must_use]
    pub fn validate_patient(&self, patient: &PatientContext) -> PatientFieldCheck {
        let mut check = PatientFieldCheck::default();
        match patient.age() {
            None => check.missing.push("age"),
            Some(age) if age <= 0 => check.invalid.push("age"),
            Some(_) => {}
        }
        check
    }

    /// Runs the image checks.
    #[must_use]
    pub fn check_image_quality(&self, image: &ImageRef) -> ImageQualityReport {
        check_image(image, &self.config)
    }

    /// Validates a patient context and image.
    ///
    /// The patient check runs first and may set `collect_more_info`; a poor
    /// image afterwards overwrites the recommendation with `retake_image`.
    /// A marginal image only adds its issues.
    #[must_use]
    pub fn run(&self, patient: &PatientContext, image: &ImageRef) -> IntakeResult {
        let fields = self.validate_patient(patient);
        let report = self.check_image_quality(image);

        let mut input_valid = true;
        let mut limitations = Vec::new();
        let mut recommendation = IntakeRecommendation::Proceed;

        if !fields.missing.is_empty() {
            input_valid = false;
            limitations.push(format!("missing patient fields: {}", fields.missing.join(", ")));
            recommendation = IntakeRecommendation::CollectMoreInfo;
        }
        if !fields.invalid.is_empty() {
            input_valid = false;
            limitations.push(format!("invalid patient fields: {}", fields.invalid.join(", ")));
            recommendation = IntakeRecommendation::CollectMoreInfo;
        }

        match report.quality {
            ImageQuality::Poor => {
                input_valid = false;
                limitations.extend(report.issues);
                recommendation = IntakeRecommendation::RetakeImage;
            }
            ImageQuality::Marginal => limitations.extend(report.issues),
            ImageQuality::Adequate => {}
        }

        tracing::info!(
            input_valid,
            image_quality = %report.quality,
            recommendation = %recommendation,
            limitations = limitations.len(),
            "Intake gate evaluated"
        );

        IntakeResult {
            input_valid,
            image_quality: report.quality,
            limitations,
            recommendation,
        }
    }

    /// Runs [`Self::run`] on the blocking thread pool so that image decoding
    /// does not stall other tasks on the runtime.
    ///
    /// If the check itself panics, the input is treated as unusable.
    pub async fn run_blocking(&self, patient: &PatientContext, image: &ImageRef) -> IntakeResult {
        let gate = self.clone();
        let patient = patient.clone();
        let image = image.clone();
        let span = tracing::Span::current();

        let result = tokio::task::spawn_blocking(move || {
            span.in_scope(|| gate.run(&patient, &image))
        })
        .await;

        match result {
            Ok(intake) => intake,
            Err(join_err) => {
                tracing::warn!(error = %join_err, "Intake check did not finish");
                Self::aborted(&join_err.to_string())
            }
        }
    }

    /// Result reported when the checks could not be completed.
    #[must_use]
    pub fn aborted(reason: &str) -> IntakeResult {
        IntakeResult {
            input_valid: false,
            image_quality: ImageQuality::Poor,
            limitations: vec![format!("intake check failed: {reason}")],
            recommendation: IntakeRecommendation::RetakeImage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{adequate_image, blurry_image, low_resolution_image, png_ref, flat_gray};
    use pretty_assertions::assert_eq;

    fn gate() -> IntakeGate {
        IntakeGate::default()
    }

    #[tokio::test]
    async fn test_blocking_run_matches_inline_run() {
        let patient = PatientContext::new(60);
        for image in [adequate_image(), blurry_image(), low_resolution_image()] {
            assert_eq!(
                gate().run_blocking(&patient, &image).await,
                gate().run(&patient, &image)
            );
        }
    }

    #[test]
    fn test_aborted_check_halts() {
        let result = IntakeGate::aborted("task cancelled");

        assert!(!result.input_valid);
        assert_eq!(result.image_quality, ImageQuality::Poor);
        assert_eq!(result.recommendation, IntakeRecommendation::RetakeImage);
        assert_eq!(result.limitations, vec!["intake check failed: task cancelled".to_string()]);
    }

    #[test]
    fn test_valid_inputs_proceed() {
        let result = gate().run(&PatientContext::new(60), &adequate_image());

        assert_eq!(
            result,
            IntakeResult {
                input_valid: true,
                image_quality: ImageQuality::Adequate,
                limitations: Vec::new(),
                recommendation: IntakeRecommendation::Proceed,
            }
        );
    }

    #[test]
    fn test_missing_age_collects_more_info_for_any_usable_image() {
        for image in [adequate_image(), low_resolution_image()] {
            let result = gate().run(&PatientContext::without_age(), &image);

            assert!(!result.input_valid);
            assert_eq!(result.recommendation, IntakeRecommendation::CollectMoreInfo);
            assert_eq!(result.limitations[0], "missing patient fields: age");
        }
    }

    #[test]
    fn test_non_positive_age_is_invalid() {
        let result = gate().run(&PatientContext::new(0), &adequate_image());

        assert!(!result.input_valid);
        assert_eq!(result.recommendation, IntakeRecommendation::CollectMoreInfo);
        assert_eq!(result.limitations, vec!["invalid patient fields: age".to_string()]);
    }

    #[test]
    fn test_low_resolution_alone_is_marginal() {
        let result = gate().run(&PatientContext::new(60), &low_resolution_image());

        assert!(result.input_valid);
        assert_eq!(result.image_quality, ImageQuality::Marginal);
        assert_eq!(result.recommendation, IntakeRecommendation::Proceed);
        assert_eq!(result.limitations, vec![LOW_RESOLUTION.to_string()]);
    }

    #[test]
    fn test_blurry_alone_is_marginal() {
        let result = gate().run(&PatientContext::new(60), &blurry_image());

        assert!(result.input_valid);
        assert_eq!(result.image_quality, ImageQuality::Marginal);
        assert_eq!(result.limitations, vec![BLURRY.to_string()]);
    }

    #[test]
    fn test_small_and_blurry_is_poor() {
        let image = png_ref(&flat_gray(200, 200));
        let result = gate().run(&PatientContext::new(60), &image);

        assert!(!result.input_valid);
        assert_eq!(result.image_quality, ImageQuality::Poor);
        assert_eq!(result.recommendation, IntakeRecommendation::RetakeImage);
    }

    #[test]
    fn test_poor_image_overwrites_collect_more_info() {
        let image = png_ref(&flat_gray(200, 200));
        let result = gate().run(&PatientContext::without_age(), &image);

        assert!(!result.input_valid);
        assert_eq!(result.recommendation, IntakeRecommendation::RetakeImage);
        assert_eq!(
            result.limitations,
            vec![
                "missing patient fields: age".to_string(),
                LOW_RESOLUTION.to_string(),
                BLURRY.to_string(),
            ]
        );
    }

    #[test]
    fn test_marginal_image_keeps_collect_more_info() {
        let result = gate().run(&PatientContext::without_age(), &low_resolution_image());

        assert!(!result.input_valid);
        assert_eq!(result.recommendation, IntakeRecommendation::CollectMoreInfo);
        assert_eq!(result.limitations.len(), 2);
    }

    #[test]
    fn test_unloadable_image() {
        let result = gate().run(
            &PatientContext::new(60),
            &ImageRef::path("/no/such/fundus.jpg"),
        );

        assert!(!result.input_valid);
        assert_eq!(result.image_quality, ImageQuality::Poor);
        assert_eq!(result.limitations, vec!["image could not be loaded".to_string()]);
        assert_eq!(result.recommendation, IntakeRecommendation::RetakeImage);
    }

    #[test]
    fn test_field_check() {
        assert!(gate().validate_patient(&PatientContext::new(1)).is_ok());
        assert_eq!(
            gate().validate_patient(&PatientContext::without_age()).missing,
            vec!["age"]
        );
    }
}
