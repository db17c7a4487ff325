//! # Outbound Boundary
//!
//! The only way a handler emits a message.
//!
//! ## Philosophy
//!
//! - **Text-Oriented**: a sender moves one complete JSON message. It knows nothing
//!   about requests, responses or call ids.
//! - **Fail Loudly**: a send that cannot be handed to the transport must return `Err`
//!   so the call that triggered it fails with `TRANSPORT_FAILURE` at once.

/// Errors that occur at the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The peer is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Sends one raw message to the peer.
///
/// This trait is object-safe (`Arc<dyn MessageSender>`).
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync + 'static {
    async fn send(&self, message: &str) -> Result<()>;
}

#[async_trait::async_trait]
impl<F> MessageSender for F
where
    F: Fn(&str) -> Result<()> + Send + Sync + 'static,
{
    async fn send(&self, message: &str) -> Result<()> {
        self(message)
    }
}
