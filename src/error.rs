//! Error types.

use thiserror::Error;

/// A request could not be assembled from the parameters it was given.
///
/// Raised synchronously while building, before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("No request mode selected (expected one of: annotate, mongo, elastic)")]
    MissingMode,
    #[error("Unknown request mode: {0}")]
    UnknownMode(String),
    #[error("Unknown verb '{verb}' for {mode} requests")]
    UnknownVerb { mode: String, verb: String },
    #[error("No call recorded for {0} request")]
    MissingCall(String),
    #[error("Annotate request is missing an entity id")]
    MissingEntity,
    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
    #[error("'{verb}' takes {expected} arguments, got {found}")]
    ArgumentCount {
        verb: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid limit '{0}': expected a non-negative integer")]
    InvalidLimit(String),
}

/// Network-level failure of a dispatched request.
///
/// Renders as `<error>[<status>]`; `status` is 0 when no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}[{status}]")]
pub struct TransportError {
    pub error: String,
    pub status: u16,
}

impl TransportError {
    pub fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            status,
        }
    }
}

/// Failure loading client configuration or request files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported file format for {path} (expected .toml or .json)")]
    UnsupportedFormat { path: String },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Top-level error for library consumers that want a single type.
#[derive(Debug, Error)]
pub enum JsonPediaError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
