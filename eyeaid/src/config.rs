//! Configuration types for the screening pipeline.
//!
//! All configuration is built once, before a run, and handed to the
//! orchestrator and oracle explicitly. Nothing here is global.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the oracle endpoint.
pub const ENV_ORACLE_URL: &str = "EYEAID_ORACLE_URL";
/// Environment variable naming the model.
pub const ENV_MODEL: &str = "EYEAID_MODEL";
/// Environment variable holding the bearer credential.
pub const ENV_API_TOKEN: &str = "EYEAID_API_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "EYEAID_TIMEOUT_SECS";
/// Environment variable that makes the bearer credential mandatory.
pub const ENV_REQUIRE_TOKEN: &str = "EYEAID_REQUIRE_TOKEN";

/// Thresholds for the deterministic intake checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Minimum acceptable width and height in pixels.
    #[serde(default = "default_min_resolution")]
    pub min_resolution: u32,
    /// Laplacian variance below which the image is considered blurry.
    #[serde(default = "default_blur_threshold")]
    pub blur_threshold: f64,
}

fn default_min_resolution() -> u32 {
    512
}

fn default_blur_threshold() -> f64 {
    100.0
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            min_resolution: default_min_resolution(),
            blur_threshold: default_blur_threshold(),
        }
    }
}

impl IntakeConfig {
    /// Creates an intake configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum resolution.
    #[must_use]
    pub fn with_min_resolution(mut self, pixels: u32) -> Self {
        self.min_resolution = pixels;
        self
    }

    /// Sets the blur threshold.
    #[must_use]
    pub fn with_blur_threshold(mut self, threshold: f64) -> Self {
        self.blur_threshold = threshold;
        self
    }

    /// Validates the thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.blur_threshold.is_finite() || self.blur_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "blur_threshold",
                "must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

/// Sampling parameters for one oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationParams {
    /// Creates generation parameters.
    #[must_use]
    pub const fn new(max_new_tokens: u32, temperature: f32) -> Self {
        Self {
            max_new_tokens,
            temperature,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(256, 0.2)
    }
}

/// Per-stage sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageGenerationParams {
    /// Screening stage.
    #[serde(default = "default_screening_params")]
    pub screening: GenerationParams,
    /// Triage stage.
    #[serde(default = "default_triage_params")]
    pub triage: GenerationParams,
    /// Documentation stage.
    #[serde(default = "default_documentation_params")]
    pub documentation: GenerationParams,
    /// Communication stage.
    #[serde(default = "default_communication_params")]
    pub communication: GenerationParams,
}

fn default_screening_params() -> GenerationParams {
    GenerationParams::new(512, 0.2)
}

fn default_triage_params() -> GenerationParams {
    GenerationParams::new(256, 0.2)
}

fn default_documentation_params() -> GenerationParams {
    GenerationParams::new(400, 0.3)
}

fn default_communication_params() -> GenerationParams {
    GenerationParams::new(300, 0.3)
}

impl Default for StageGenerationParams {
    fn default() -> Self {
        Self {
            screening: default_screening_params(),
            triage: default_triage_params(),
            documentation: default_documentation_params(),
            communication: default_communication_params(),
        }
    }
}

/// Everything the orchestrator needs besides the oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Intake thresholds.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Sampling parameters per stage.
    #[serde(default)]
    pub generation: StageGenerationParams,
}

impl PipelineConfig {
    /// Creates a pipeline configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the intake thresholds.
    #[must_use]
    pub fn with_intake(mut self, intake: IntakeConfig) -> Self {
        self.intake = intake;
        self
    }

    /// Sets the per-stage sampling parameters.
    #[must_use]
    pub fn with_generation(mut self, generation: StageGenerationParams) -> Self {
        self.generation = generation;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.intake.validate()
    }
}

/// Connection settings for an HTTP reasoning backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional bearer credential.
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the backend refuses unauthenticated requests.
    #[serde(default)]
    pub token_required: bool,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "medgemma".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
            token_required: false,
        }
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{raw}' is not a boolean"))),
    }
}

impl OracleConfig {
    /// Creates an oracle configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_ORACLE_URL) {
            config.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config.model = model;
        }
        config.api_token = lookup(ENV_API_TOKEN).filter(|t| !t.trim().is_empty());
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(ENV_TIMEOUT_SECS, format!("'{raw}' is not a whole number of seconds"))
            })?;
        }
        if let Some(raw) = lookup(ENV_REQUIRE_TOKEN) {
            config.token_required = parse_flag(ENV_REQUIRE_TOKEN, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the bearer credential.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Makes the bearer credential mandatory.
    #[must_use]
    pub fn with_token_required(mut self, required: bool) -> Self {
        self.token_required = required;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Validates the configuration.
    ///
    /// A required but absent credential is reported as missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                ENV_ORACLE_URL,
                format!("'{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid(ENV_MODEL, "model name is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(ENV_TIMEOUT_SECS, "timeout must be positive"));
        }
        if self.token_required {
            self.require_token()?;
        }
        Ok(())
    }

    /// Returns the credential, or `Missing` when none is configured.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.api_token
            .as_deref()
            .ok_or_else(|| ConfigError::missing(ENV_API_TOKEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_intake_defaults() {
        let config = IntakeConfig::default();
        assert_eq!(config.min_resolution, 512);
        assert!((config.blur_threshold - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_intake_partial_deserialize() {
        let config: IntakeConfig = serde_json::from_str(r#"{"min_resolution": 256}"#).unwrap();
        assert_eq!(config.min_resolution, 256);
        assert!((config.blur_threshold - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_intake_rejects_negative_threshold() {
        let config = IntakeConfig::new().with_blur_threshold(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generation_defaults() {
        let params = StageGenerationParams::default();
        assert_eq!(params.screening.max_new_tokens, 512);
        assert_eq!(params.triage.max_new_tokens, 256);
        assert_eq!(params.documentation.max_new_tokens, 400);
        assert_eq!(params.communication.max_new_tokens, 300);
    }

    #[test]
    fn test_oracle_from_empty_env_uses_defaults() {
        let config = OracleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, OracleConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_oracle_from_env_overrides() {
        let config = OracleConfig::from_lookup(lookup(&[
            (ENV_ORACLE_URL, "https://inference.local/"),
            (ENV_MODEL, "medgemma:4b"),
            (ENV_API_TOKEN, "secret"),
            (ENV_TIMEOUT_SECS, "45"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint(), "https://inference.local");
        assert_eq!(config.model, "medgemma:4b");
        assert_eq!(config.require_token().unwrap(), "secret");
        assert_eq!(config.timeout_secs, 45);
    }

    #[test]
    fn test_oracle_bad_timeout() {
        let err = OracleConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = OracleConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_oracle_bad_url() {
        let err = OracleConfig::from_lookup(lookup(&[(ENV_ORACLE_URL, "localhost:11434")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_ORACLE_URL));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let config = OracleConfig::from_lookup(lookup(&[(ENV_API_TOKEN, "  ")])).unwrap();
        assert_eq!(
            config.require_token().unwrap_err(),
            ConfigError::missing(ENV_API_TOKEN)
        );
    }

    #[test]
    fn test_required_token_must_be_set() {
        let err = OracleConfig::from_lookup(lookup(&[(ENV_REQUIRE_TOKEN, "true")])).unwrap_err();
        assert_eq!(err, ConfigError::missing(ENV_API_TOKEN));

        let err = OracleConfig::from_lookup(lookup(&[
            (ENV_REQUIRE_TOKEN, "1"),
            (ENV_API_TOKEN, "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::missing(ENV_API_TOKEN));

        let config = OracleConfig::from_lookup(lookup(&[
            (ENV_REQUIRE_TOKEN, "yes"),
            (ENV_API_TOKEN, "secret"),
        ]))
        .unwrap();
        assert!(config.token_required);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_require_token_flag_parsing() {
        let config = OracleConfig::from_lookup(lookup(&[(ENV_REQUIRE_TOKEN, "false")])).unwrap();
        assert!(!config.token_required);

        let err = OracleConfig::from_lookup(lookup(&[(ENV_REQUIRE_TOKEN, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_required_token_checked_by_builder_validation() {
        let config = OracleConfig::new().with_token_required(true);
        assert_eq!(config.validate().unwrap_err(), ConfigError::missing(ENV_API_TOKEN));
        assert!(config.with_api_token("secret").validate().is_ok());
    }

    #[test]
    fn test_token_not_serialized() {
        let config = OracleConfig::new().with_api_token("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
