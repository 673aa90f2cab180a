//! HTTP reasoning backend speaking the Ollama `/api/generate` protocol.

use super::{CompletionRequest, InferenceOracle};
use crate::config::OracleConfig;
use crate::errors::{ConfigError, OracleError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Request body for `/api/generate`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

/// Response body from `/api/generate`.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Oracle backed by a local or remote HTTP inference server.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Creates an oracle from validated configuration.
    pub fn new(config: OracleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::invalid("http_client", e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Creates an oracle from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(OracleConfig::from_env()?)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::timeout(self.config.timeout_secs)
        } else if err.is_connect() {
            OracleError::Connection(self.config.endpoint().to_string())
        } else if err.is_decode() {
            OracleError::ResponseParsing(err.to_string())
        } else {
            OracleError::other(err.to_string())
        }
    }
}

fn map_status(status: u16, body: String) -> OracleError {
    match status {
        429 | 503 | 507 => OracleError::ResourceExhausted(format!("{status}: {body}")),
        _ => OracleError::backend(status, body),
    }
}

#[async_trait]
impl InferenceOracle for HttpOracle {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        let images = match &request.image {
            Some(image) => {
                let bytes = image
                    .load_bytes()
                    .await
                    .map_err(|e| OracleError::Image(e.to_string()))?;
                vec![base64::engine::general_purpose::STANDARD.encode(bytes)]
            }
            None => Vec::new(),
        };

        let body = GenerateRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            images,
            stream: false,
            options: GenerateOptions {
                num_predict: request.params.max_new_tokens,
                temperature: request.params.temperature,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        let mut builder = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OracleError::ResponseParsing(e.to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            response_chars = parsed.response.len(),
            "Oracle call finished"
        );

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;

    #[test]
    fn test_rejects_invalid_config() {
        let config = OracleConfig::new().with_base_url("ftp://nowhere");
        assert!(HttpOracle::new(config).is_err());
    }

    #[test]
    fn test_required_token_blocks_construction() {
        let config = OracleConfig::new().with_token_required(true);
        assert_eq!(
            HttpOracle::new(config).unwrap_err(),
            ConfigError::missing(crate::config::ENV_API_TOKEN)
        );

        let config = OracleConfig::new()
            .with_token_required(true)
            .with_api_token("secret");
        assert!(HttpOracle::new(config).is_ok());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(503, "busy".to_string()),
            OracleError::ResourceExhausted(_)
        ));
        assert!(matches!(
            map_status(500, "boom".to_string()),
            OracleError::Backend { status: 500, .. }
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "medgemma",
            prompt: "describe",
            images: Vec::new(),
            stream: false,
            options: GenerateOptions {
                num_predict: GenerationParams::default().max_new_tokens,
                temperature: 0.5,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "medgemma");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 256);
        assert!(value.get("images").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_oracle_error() {
        let config = OracleConfig::new()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout_secs(2);
        let oracle = HttpOracle::new(config).unwrap();

        let request = CompletionRequest::text("hello", GenerationParams::default());
        assert!(oracle.complete(&request).await.is_err());
    }
}
