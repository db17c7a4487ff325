//! # Exception Taxonomy
//!
//! The classification a failure carries when it crosses the wire.
//!
//! These are distinct from [`crate::Error`]: an `ExceptionInfo` describes the
//! *remote call* failing, whereas `Error` describes the *envelope* being unreadable.

use serde::Deserialize;
use serde::Serialize;

/// Why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionKind {
    /// An exception the method declares, rebuildable from its class name and message.
    UserDeclared,
    /// The implementation was asked to act in a state that does not allow it.
    IllegalState,
    /// An argument was rejected, or could not be decoded.
    IllegalArgument,
    /// The method is not callable over RPC.
    NotSupported,
    /// No stub is registered under the target instance id.
    StubNotFound,
    /// The method table does not know the method, or a dispatch hook vetoed the call.
    DispatchRejected,
    /// The caller stopped waiting for a response.
    Timeout,
    /// The message could not be handed to the transport, or the handler went away.
    TransportFailure,
    /// Anything else. Unknown kinds received from a peer decode to this.
    #[serde(other)]
    GenericRuntime,
}

impl ExceptionKind {
    /// The class name used when a failure of this kind has no more specific one.
    pub fn default_class_name(self) -> &'static str {
        match self {
            Self::UserDeclared => "UserDeclared",
            Self::IllegalState => "IllegalState",
            Self::IllegalArgument => "IllegalArgument",
            Self::NotSupported => "NotSupported",
            Self::StubNotFound => "StubNotFound",
            Self::DispatchRejected => "DispatchRejected",
            Self::Timeout => "Timeout",
            Self::TransportFailure => "TransportFailure",
            Self::GenericRuntime => "GenericRuntime",
        }
    }
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_class_name())
    }
}

/// A failure as carried by a Response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionInfo {
    pub kind: ExceptionKind,
    pub class_name: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ExceptionInfo {
    pub fn new(
        kind: ExceptionKind,
        class_name: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            kind,
            class_name: class_name.into(),
            message,
        }
    }

    /// A failure of `kind` under the kind's own class name.
    pub fn of_kind(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self::new(kind, kind.default_class_name(), Some(message.into()))
    }
}

impl std::fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({}): {}", self.class_name, self.kind, message),
            None => write!(f, "{} ({})", self.class_name, self.kind),
        }
    }
}
