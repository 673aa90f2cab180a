//! Synthetic fundus images for tests.

use crate::core::{ScreeningObservation, ScreeningResult, TriageLevel, TriageResult};
use crate::oracle::ImageRef;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A black and white checkerboard with square blocks of `block` pixels.
///
/// Sharp edges everywhere, so the Laplacian variance is high.
#[must_use]
pub fn checkerboard(width: u32, height: u32, block: u32) -> DynamicImage {
    let block = block.max(1);
    let img = RgbImage::from_fn(width, height, |x, y| {
        if ((x / block) + (y / block)) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// A uniform mid-gray image. Its Laplacian variance is zero.
#[must_use]
pub fn flat_gray(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])))
}

/// Encodes an image as PNG bytes.
///
/// # Panics
///
/// Panics if PNG encoding fails, which only happens for unsupported pixel
/// layouts.
#[must_use]
pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    #[allow(clippy::expect_used)]
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("PNG encoding of a test image");
    buffer.into_inner()
}

/// Encodes an image as an in-memory PNG reference.
#[must_use]
pub fn png_ref(image: &DynamicImage) -> ImageRef {
    ImageRef::bytes(png_bytes(image))
}

/// A 512x512 sharp image that passes every quality check.
#[must_use]
pub fn adequate_image() -> ImageRef {
    png_ref(&checkerboard(512, 512, 8))
}

/// A 600x600 featureless image that only fails the blur check.
#[must_use]
pub fn blurry_image() -> ImageRef {
    png_ref(&flat_gray(600, 600))
}

/// A sharp image with one dimension below 512 pixels.
#[must_use]
pub fn low_resolution_image() -> ImageRef {
    png_ref(&checkerboard(400, 600, 8))
}

/// A small featureless image that fails both checks.
#[must_use]
pub fn poor_image() -> ImageRef {
    png_ref(&flat_gray(200, 200))
}

/// A well-formed screening record.
#[must_use]
pub fn sample_screening() -> ScreeningResult {
    ScreeningResult {
        observations: vec![
            ScreeningObservation::new("microaneurysms", "inferotemporal arcade", "medium"),
            ScreeningObservation::new("optic disc", "center", "high"),
        ],
        overall_assessment: "Scattered microaneurysms; optic disc margins sharp".to_string(),
        uncertainty_notes: "Peripheral retina partially out of frame".to_string(),
    }
}

/// A well-formed triage record at the given level.
#[must_use]
pub fn sample_triage(level: TriageLevel) -> TriageResult {
    TriageResult {
        level,
        reasoning: "Findings consistent with early microvascular change".to_string(),
        recommended_action: "Ophthalmology review within 3 months".to_string(),
    }
}
