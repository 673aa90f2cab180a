//! Deterministic image quality metrics.
//!
//! No inference happens here: resolution is read from the decoded image and
//! sharpness is the variance of a Laplacian edge filter over the grayscale
//! image.

use crate::config::IntakeConfig;
use crate::core::ImageQualityReport;
use crate::errors::ImageError;
use crate::oracle::ImageRef;
use image::{DynamicImage, GrayImage, Luma, RgbImage};

/// Issue recorded when either dimension is below the minimum.
pub const LOW_RESOLUTION: &str = "low resolution";
/// Issue recorded when the Laplacian variance is below the threshold.
pub const BLURRY: &str = "image appears blurry";

/// Decodes an image reference into pixels.
pub fn load_image(image: &ImageRef) -> Result<DynamicImage, ImageError> {
    let bytes = image.read_bytes()?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Converts RGB to grayscale using ITU-R BT.601 luma weights.
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (x, y, p) in rgb.enumerate_pixels() {
        let luma = 0.114f32.mul_add(
            f32::from(p.0[2]),
            0.299f32.mul_add(f32::from(p.0[0]), 0.587 * f32::from(p.0[1])),
        );
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    gray
}

/// Variance of the 4-neighbour Laplacian `[0,1,0; 1,-4,1; 0,1,0]`.
///
/// Computed over interior pixels; images smaller than 3x3 score 0.0.
/// Higher means sharper.
pub fn laplacian_variance(img: &GrayImage) -> f64 {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| f64::from(img.get_pixel(x, y).0[0]);
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let laplacian =
                px(x, y - 1) + px(x, y + 1) + px(x - 1, y) + px(x + 1, y) - 4.0 * px(x, y);
            sum += laplacian;
            sum_sq += laplacian * laplacian;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    mean.mul_add(-mean, sum_sq / n).max(0.0)
}

/// Measures a decoded image against the configured thresholds.
pub fn assess(image: &DynamicImage, config: &IntakeConfig) -> ImageQualityReport {
    let mut issues = Vec::new();

    if image.width() < config.min_resolution || image.height() < config.min_resolution {
        issues.push(LOW_RESOLUTION.to_string());
    }

    let gray = to_grayscale(&image.to_rgb8());
    let variance = laplacian_variance(&gray);
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        laplacian_variance = variance,
        "Image metrics computed"
    );

    if variance < config.blur_threshold {
        issues.push(BLURRY.to_string());
    }

    ImageQualityReport::from_issues(issues)
}

/// Loads and assesses an image; an undecodable image is reported as poor.
pub fn check_image(image: &ImageRef, config: &IntakeConfig) -> ImageQualityReport {
    match load_image(image) {
        Ok(decoded) => assess(&decoded, config),
        Err(err) => {
            tracing::warn!(error = %err, image = ?image, "Image could not be loaded");
            ImageQualityReport::unreadable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageQuality;
    use crate::testing::{checkerboard, flat_gray};

    #[test]
    fn test_flat_image_has_zero_variance() {
        let gray = to_grayscale(&flat_gray(32, 32).to_rgb8());
        assert!(laplacian_variance(&gray).abs() < f64::EPSILON);
    }

    #[test]
    fn test_checkerboard_is_sharp() {
        let gray = to_grayscale(&checkerboard(64, 64, 4).to_rgb8());
        assert!(laplacian_variance(&gray) > 1000.0);
    }

    #[test]
    fn test_tiny_image_scores_zero() {
        let gray = GrayImage::new(2, 2);
        assert!(laplacian_variance(&gray).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grayscale_weights() {
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        assert_eq!(to_grayscale(&rgb).get_pixel(0, 0).0[0], 76);
    }

    #[test]
    fn test_assess_adequate() {
        let report = assess(&checkerboard(512, 512, 4), &IntakeConfig::default());
        assert_eq!(report.quality, ImageQuality::Adequate);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_assess_low_resolution_only() {
        let report = assess(&checkerboard(511, 600, 4), &IntakeConfig::default());
        assert_eq!(report.quality, ImageQuality::Marginal);
        assert_eq!(report.issues, vec![LOW_RESOLUTION.to_string()]);
    }

    #[test]
    fn test_assess_small_and_blurry() {
        let report = assess(&flat_gray(100, 100), &IntakeConfig::default());
        assert_eq!(report.quality, ImageQuality::Poor);
        assert_eq!(report.issues, vec![LOW_RESOLUTION.to_string(), BLURRY.to_string()]);
    }

    #[test]
    fn test_check_image_unreadable() {
        let report = check_image(&ImageRef::bytes(b"not an image".to_vec()), &IntakeConfig::default());
        assert_eq!(report, ImageQualityReport::unreadable());
    }

    #[test]
    fn test_custom_thresholds() {
        let config = IntakeConfig::new()
            .with_min_resolution(64)
            .with_blur_threshold(0.0);
        let report = assess(&flat_gray(64, 64), &config);
        assert_eq!(report.quality, ImageQuality::Adequate);
    }
}
