// sieve-common/src/error.rs
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SieveError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Parsing Error in {0}: {1}")]
    Parse(&'static str, String),

    #[error("Invalid content rule pattern '{0}': {1}")]
    InvalidPattern(String, String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Source '{0}' failed: {1}")]
    Source(String, String),

    #[error("Artifact view failed: {0}")]
    ArtifactView(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        SieveError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for SieveError {
    fn from(err: toml::de::Error) -> Self {
        SieveError::Toml(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SieveError>;
