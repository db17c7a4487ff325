//! User exceptions thrown by [`crate::EchoService::test_exception_thrown`].

use objwire::Constructor;
use objwire::Exception;

/// Rebuildable from its message, so it crosses the wire intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomException {
    pub message: String,
}

impl Default for CustomException {
    fn default() -> Self {
        Self {
            message: "custom exception".into(),
        }
    }
}

impl Exception for CustomException {
    const CLASS_NAME: &'static str = "sample.CustomException";
    const CONSTRUCTOR: Constructor = Constructor::Message;

    fn message(&self) -> Option<String> {
        Some(self.message.clone())
    }

    fn rebuild(message: Option<String>) -> Option<Self> {
        Some(message.map(|message| Self { message }).unwrap_or_default())
    }
}

impl std::fmt::Display for CustomException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CustomException {}

/// Needs two values to build; the peer only ever sees a generic failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomException2Arg {
    pub first: i32,
    pub second: i32,
}

impl Exception for CustomException2Arg {
    const CLASS_NAME: &'static str = "sample.CustomException2Arg";
    const CONSTRUCTOR: Constructor = Constructor::Other;

    fn message(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn rebuild(_message: Option<String>) -> Option<Self> {
        None
    }
}

impl std::fmt::Display for CustomException2Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "custom exception ({}, {})", self.first, self.second)
    }
}

impl std::error::Error for CustomException2Arg {}
