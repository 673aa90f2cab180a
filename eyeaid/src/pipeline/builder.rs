//! Orchestrator builder with validation.

use super::PipelineOrchestrator;
use crate::config::PipelineConfig;
use crate::errors::{ConfigError, EyeaidError};
use crate::events::{EventSink, NoOpEventSink};
use crate::oracle::InferenceOracle;
use std::fmt;
use std::sync::Arc;

/// Builder for a [`PipelineOrchestrator`].
///
/// An oracle is required. The configuration defaults to
/// [`PipelineConfig::default`] and the event sink to [`NoOpEventSink`].
#[derive(Default)]
pub struct PipelineOrchestratorBuilder {
    oracle: Option<Arc<dyn InferenceOracle>>,
    config: PipelineConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl PipelineOrchestratorBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reasoning backend.
    #[must_use]
    pub fn oracle(mut self, oracle: Arc<dyn InferenceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Sets the pipeline configuration.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the configuration and builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no oracle was set or the
    /// configuration is invalid.
    pub fn build(self) -> Result<PipelineOrchestrator, EyeaidError> {
        let oracle = self.oracle.ok_or_else(|| ConfigError::missing("oracle"))?;
        self.config.validate()?;
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(NoOpEventSink) as Arc<dyn EventSink>);

        tracing::debug!(
            min_resolution = self.config.intake.min_resolution,
            blur_threshold = self.config.intake.blur_threshold,
            "Pipeline orchestrator built"
        );

        Ok(PipelineOrchestrator::new(oracle, self.config, sink))
    }
}

impl fmt::Debug for PipelineOrchestratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOrchestratorBuilder")
            .field("has_oracle", &self.oracle.is_some())
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntakeConfig;
    use crate::testing::ScriptedOracle;

    #[test]
    fn test_oracle_is_required() {
        let err = PipelineOrchestratorBuilder::new().build().unwrap_err();
        assert!(matches!(
            err,
            EyeaidError::Config(ConfigError::Missing(ref field)) if field == "oracle"
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig::new().with_intake(IntakeConfig::new().with_blur_threshold(-1.0));
        let result = PipelineOrchestratorBuilder::new()
            .oracle(Arc::new(ScriptedOracle::well_formed()))
            .config(config)
            .build();
        assert!(matches!(result, Err(EyeaidError::Config(ConfigError::Invalid { .. }))));
    }

    #[test]
    fn test_builds_with_defaults() {
        let orchestrator = PipelineOrchestratorBuilder::new()
            .oracle(Arc::new(ScriptedOracle::well_formed()))
            .build()
            .unwrap();
        assert_eq!(orchestrator.config(), &PipelineConfig::default());
    }
}
