//! # objwire-echo
//!
//! A sample interface pair served over objwire: an [`EchoService`] and the
//! [`EchoServiceListener`] callbacks it invokes on its clients.
//!
//! ## Architecture
//!
//! - [`service`] / [`listener`]: the interface traits and their method tables.
//! - [`bindings`]: proxies and stubs, the part an interface generator would emit.
//! - [`EchoServiceImpl`]: the serving implementation.
//! - [`model`] / [`exception`]: the plain data and user exceptions the methods use.

pub mod bindings;
pub mod exception;
pub mod listener;
pub mod model;
pub mod service;

mod service_impl;

pub use exception::CustomException;
pub use exception::CustomException2Arg;
pub use listener::EchoServiceListener;
pub use model::ComplexObject;
pub use model::Family;
pub use model::MyObj;
pub use model::Sex;
pub use service::EchoService;
pub use service_impl::EchoServiceImpl;
