//! # objwire
//!
//! An object RPC runtime: two [`MessageHandler`]s exchange JSON messages over any
//! text channel, and calls on a [`Proxy`] on one side run on a [`Stub`] on the other.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - [`interface`]: generated method tables, one [`Method`] per callable.
//! - [`Value`] / [`Args`]: plain data or an object passed by reference.
//! - [`Remote`] / [`RemoteObject`]: glue between interface traits and the runtime.
//! - [`Stub`] / [`Dispatch`]: serving one implementation under one instance id.
//! - [`Proxy`]: calling one object on the peer.
//! - [`MessageHandler`]: owns the registry, pending calls, delegates and extras.
//! - [`MessageSender`]: the only way out; inbound text arrives through
//!   [`MessageHandler::on_message`].

mod codec;
mod delegate;
mod error;
mod extras;
mod handler;
mod listener;
mod lock;
mod proxy;
mod registry;
mod remote;
mod stub;
mod value;

pub mod channel;
pub mod config;
pub mod interface;
pub mod sender;


pub use config::HandlerConfig;
pub use delegate::MethodDelegate;
pub use error::Constructor;
pub use error::Error;
pub use error::Exception;
pub use error::Result;
pub use extras::Property;
pub use handler::HandlerBuilder;
pub use handler::MessageHandler;
pub use handler::WeakHandler;
pub use interface::Interface;
pub use interface::Kind;
pub use interface::Method;
pub use listener::FailureListener;
pub use listener::FailureSource;
pub use proxy::Proxy;
pub use proxy::Reply;
pub use remote::ObjectKey;
pub use remote::Remote;
pub use remote::RemoteObject;
pub use remote::object_key;
pub use remote::same_object;
pub use sender::MessageSender;
pub use stub::Dispatch;
pub use stub::DispatchContext;
pub use stub::DispatchKey;
pub use stub::Hook;
pub use stub::Stub;
pub use value::Args;
pub use value::LocalObject;
pub use value::Value;

pub use objwire_proto as proto;
pub use objwire_proto::ExceptionInfo;
pub use objwire_proto::ExceptionKind;
pub use objwire_proto::Extras;
