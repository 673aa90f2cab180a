//! Testing utilities for eyeaid pipelines.
//!
//! This module provides:
//! - Scripted and failing oracles
//! - Synthetic fundus images and sample records
//! - Assertions over pipeline outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_completed, assert_stopped_at, assert_texts_marked, assert_triage_level,
    assert_wire_keys,
};
pub use fixtures::{
    adequate_image, blurry_image, checkerboard, flat_gray, low_resolution_image, png_bytes,
    png_ref, poor_image, sample_screening, sample_triage,
};
pub use mocks::{FailingOracle, RecordedCall, ScriptedOracle};
