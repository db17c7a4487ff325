//! Handler configuration.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Default deadline for synchronous calls.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(String),
    /// A zero timeout would fail every synchronous call.
    ZeroTimeout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid handler config: {}", msg),
            Self::ZeroTimeout => write!(f, "request timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Settings of one [`crate::MessageHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Recorded on every log event of the handler.
    pub name: String,
    pub request_timeout_ms: u64,
    /// Per-message tracing at `debug` level.
    pub log_enabled: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            name: "objwire".to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_enabled: false,
        }
    }
}

impl HandlerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reads a config from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(Error::ZeroTimeout);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
