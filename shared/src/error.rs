//! Error types for the smart home skill.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a smart home directive.
#[derive(Error, Debug)]
pub enum Error {
    /// Request bytes are not JSON, or a required object is missing
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Capability list could not be parsed
    #[error("Malformed capabilities: {0}")]
    MalformedCapabilities(String),

    /// A JSON argument to the response builder was invalid
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// Device state store write failed
    #[error("Device store error: {0}")]
    DeviceStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Error type reported in an `ErrorResponse` payload.
    pub fn response_type(&self) -> &'static str {
        match self {
            Error::DeviceStore(_) => "ENDPOINT_UNREACHABLE",
            _ => "INTERNAL_ERROR",
        }
    }
}
