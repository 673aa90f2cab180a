//! The reasoning capability consumed by every inference stage.
//!
//! Stages and the orchestrator depend only on [`InferenceOracle`], never on
//! a concrete backend, so every run can be driven by a deterministic mock.

mod image_ref;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpOracle;
pub use image_ref::ImageRef;

use crate::config::GenerationParams;
use crate::errors::OracleError;
use async_trait::async_trait;

/// One request to the reasoning backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Image to condition on, for multimodal calls.
    pub image: Option<ImageRef>,
    /// Sampling parameters.
    pub params: GenerationParams,
}

impl CompletionRequest {
    /// Creates a text-only request.
    #[must_use]
    pub fn text(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            params,
        }
    }

    /// Attaches an image.
    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// Returns true if an image is attached.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Ask a reasoning backend a prompt, optionally with an image, get text back.
///
/// Implementations own their timeout policy: a call must either return text
/// or fail with an [`OracleError`] within the configured bound. Calls may be
/// issued concurrently; an implementation that serializes internally must do
/// so without requiring the caller to hold any lock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceOracle: Send + Sync {
    /// Completes a prompt.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError>;
}
