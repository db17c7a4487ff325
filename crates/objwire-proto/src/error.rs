//! # Error Definitions
//!
//! Failures while turning wire text into messages and back.

/// Operational failures of the envelope codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The text was not valid JSON, or a field had the wrong JSON type.
    Json(String),
    /// The JSON was well formed but does not describe a valid message.
    ProtocolViolation(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "malformed json: {}", msg),
            Self::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// A specialized Result type for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;
