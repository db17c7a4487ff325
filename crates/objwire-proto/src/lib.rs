//! # objwire-proto
//!
//! The JSON envelope exchanged between two objwire message handlers.
//!
//! ## Architecture
//!
//! Every wire message is a single JSON object. Requests carry a `methodId` key,
//! responses never do; that key alone decides how an inbound text is decoded.
//! Arguments and results stay as opaque `serde_json::Value`s at this layer: the
//! runtime decides, per declared parameter kind, whether a value is plain data or a
//! [`RemoteRef`] to an object living on the sender's side.
//!
//! ```text
//! {"callId":7,"instanceId":0,"interface":"sample.EchoService","methodId":3,
//!  "args":["World"],"oneWay":false,"extras":{"custom_B":"B1"}}
//! {"callId":7,"result":"WorldResult","extras":{"custom_B":"B1"}}
//! ```

mod error;
mod exception;
mod message;


pub use error::Error;
pub use error::Result;
pub use exception::ExceptionInfo;
pub use exception::ExceptionKind;
pub use message::Extras;
pub use message::Message;
pub use message::Outcome;
pub use message::RemoteRef;
pub use message::Request;
pub use message::Response;

/// Instance id of the service a handler exposes without any prior exchange.
pub const ROOT_INSTANCE_ID: i64 = 0;

/// Prefix marking an extra as cross-cutting metadata that the receiver echoes back.
pub const CUSTOM_PREFIX: &str = "custom_";

/// Returns the extras key a property named `name` travels under.
pub fn custom_key(name: &str) -> String {
    format!("{CUSTOM_PREFIX}{name}")
}

/// Whether an extras key belongs to the echoed `custom_` namespace.
pub fn is_custom(key: &str) -> bool {
    key.starts_with(CUSTOM_PREFIX)
}
