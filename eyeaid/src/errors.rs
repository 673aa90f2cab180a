//! Error types for the eyeaid pipeline.
//!
//! Only [`ConfigError`] ever reaches a caller as a hard failure. Oracle and
//! image errors are recovered inside the stage or gate that observes them and
//! surface only as text inside a degraded record.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for eyeaid operations that can fail before a run.
#[derive(Debug, Error)]
pub enum EyeaidError {
    /// The pipeline could not be configured.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// An image could not be read or decoded.
    #[error("{0}")]
    Image(#[from] ImageError),

    /// The reasoning backend failed.
    #[error("{0}")]
    Oracle(#[from] OracleError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of the reasoning capability.
///
/// Every variant is caught at the stage boundary and converted into that
/// stage's safety fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The call did not finish within the configured timeout.
    #[error("Oracle request timed out after {timeout_secs}s")]
    Timeout {
        /// The configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The backend could not be reached.
    #[error("Cannot reach oracle at {0}")]
    Connection(String),

    /// The backend answered with a non-success status.
    #[error("Oracle backend returned {status}: {body}")]
    Backend {
        /// HTTP-like status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The backend ran out of memory, slots or quota.
    #[error("Oracle resources exhausted: {0}")]
    ResourceExhausted(String),

    /// The image handed to the oracle could not be prepared.
    #[error("Oracle could not read image: {0}")]
    Image(String),

    /// The backend response envelope could not be decoded.
    #[error("Oracle response could not be decoded: {0}")]
    ResponseParsing(String),

    /// Any other fault.
    #[error("Oracle failure: {0}")]
    Other(String),
}

impl OracleError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates a backend status error.
    #[must_use]
    pub fn backend(status: u16, body: impl Into<String>) -> Self {
        Self::Backend {
            status,
            body: body.into(),
        }
    }

    /// Creates a catch-all error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Short machine-readable kind, used in events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connection(_) => "connection",
            Self::Backend { .. } => "backend",
            Self::ResourceExhausted(_) => "resource_exhausted",
            Self::Image(_) => "image",
            Self::ResponseParsing(_) => "response_parsing",
            Self::Other(_) => "other",
        }
    }

    /// Converts to a dictionary representation, as carried by fallback events.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// An unreadable or corrupt image.
///
/// Recovered by the intake gate into the `poor` quality bucket.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file could not be read.
    #[error("Cannot read image {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a decodable image.
    #[error("Cannot decode image: {0}")]
    Decode(String),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Configuration problems detected before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("Missing required setting: {0}")]
    Missing(String),

    /// A setting is present but unusable.
    #[error("Invalid setting '{field}': {reason}")]
    Invalid {
        /// The setting name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a missing setting error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Creates an invalid setting error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
