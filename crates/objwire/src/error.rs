//! # Call Failures
//!
//! Every failure a call can surface, in the same classification the wire uses.
//!
//! ## Philosophy
//!
//! - **One shape on both sides**: a failure raised by an implementation, a failure
//!   synthesized by a handler and a failure read back from a Response are all an
//!   [`ExceptionInfo`]. The only local-only variant is the delegate sentinel.
//! - **Reconstruction by name**: user exceptions implement [`Exception`] so a caller
//!   can [`Error::downcast`] a received failure back into its concrete type.

use objwire_proto::ExceptionInfo;
use objwire_proto::ExceptionKind;

/// A failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A classified failure, raised locally or received from the peer.
    Rpc(ExceptionInfo),
    /// Raised by a method delegate to fall through to the real implementation.
    DelegateIgnored,
}

impl Error {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self::Rpc(ExceptionInfo::of_kind(kind, message))
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::IllegalState, message)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::IllegalArgument, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NotSupported, message)
    }

    pub fn stub_not_found(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::StubNotFound, message)
    }

    pub fn dispatch_rejected(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::DispatchRejected, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::TransportFailure, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::GenericRuntime, message)
    }

    /// Marshals a user exception.
    ///
    /// Exceptions that can be rebuilt from their message travel as `USER_DECLARED`.
    /// The rest degrade to `GENERIC_RUNTIME`, keeping the class name and a message.
    pub fn user<E: Exception>(exception: &E) -> Self {
        match E::CONSTRUCTOR {
            Constructor::NoArgs | Constructor::Message => Self::Rpc(ExceptionInfo::new(
                ExceptionKind::UserDeclared,
                E::CLASS_NAME,
                exception.message(),
            )),
            Constructor::Other => {
                let message = exception.message().unwrap_or_else(|| E::CLASS_NAME.to_string());
                Self::Rpc(ExceptionInfo::new(
                    ExceptionKind::GenericRuntime,
                    E::CLASS_NAME,
                    Some(message),
                ))
            }
        }
    }

    /// The sentinel a delegate returns to let the real implementation run.
    pub fn ignore_delegate() -> Self {
        Self::DelegateIgnored
    }

    pub fn kind(&self) -> ExceptionKind {
        match self {
            Self::Rpc(info) => info.kind,
            Self::DelegateIgnored => ExceptionKind::GenericRuntime,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::Rpc(info) => &info.class_name,
            Self::DelegateIgnored => "DelegateIgnored",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rpc(info) => info.message.as_deref(),
            Self::DelegateIgnored => None,
        }
    }

    /// The failure as it would be written into a Response.
    pub fn into_info(self) -> ExceptionInfo {
        match self {
            Self::Rpc(info) => info,
            Self::DelegateIgnored => ExceptionInfo::of_kind(
                ExceptionKind::GenericRuntime,
                "delegate ignored outside of a delegated call",
            ),
        }
    }

    /// Rebuilds a concrete user exception from a received failure.
    ///
    /// Returns `None` when the failure is not a `USER_DECLARED` of class `E`.
    pub fn downcast<E: Exception>(&self) -> Option<E> {
        match self {
            Self::Rpc(info)
                if info.kind == ExceptionKind::UserDeclared && info.class_name == E::CLASS_NAME =>
            {
                E::rebuild(info.message.clone())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rpc(info) => write!(f, "{}", info),
            Self::DelegateIgnored => write!(f, "delegate ignored the call"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ExceptionInfo> for Error {
    fn from(info: ExceptionInfo) -> Self {
        Self::Rpc(info)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Rpc(ExceptionInfo::new(
            ExceptionKind::IllegalArgument,
            "Codec",
            Some(e.to_string()),
        ))
    }
}

impl From<objwire_proto::Error> for Error {
    fn from(e: objwire_proto::Error) -> Self {
        Self::Rpc(ExceptionInfo::new(
            ExceptionKind::IllegalArgument,
            "Codec",
            Some(e.to_string()),
        ))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How a user exception is constructed, which decides whether it survives the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constructor {
    NoArgs,
    Message,
    /// Needs more than a message; cannot be rebuilt on the far side.
    Other,
}

/// A user-declared exception type.
pub trait Exception: Sized + Send + Sync + 'static {
    /// The name the exception travels under. Must be unique per deployment.
    const CLASS_NAME: &'static str;
    const CONSTRUCTOR: Constructor;

    fn message(&self) -> Option<String>;

    /// Rebuilds the exception on the receiving side.
    fn rebuild(message: Option<String>) -> Option<Self>;
}
