//! # Method Delegates
//!
//! Per-`(interface, method id)` overrides, consulted by a proxy before any message
//! leaves and by a stub before the real implementation runs.
//!
//! A delegate is an implementation of the interface in its own right; only the one
//! method it is registered for is routed to it. Returning
//! [`Error::DelegateIgnored`](crate::Error::DelegateIgnored) from that method makes
//! the call continue as if no delegate existed.

use std::sync::Arc;

use crate::interface::Interface;
use crate::remote::ObjectKey;
use crate::remote::Remote;
use crate::remote::object_key;
use crate::stub::Dispatch;
use crate::stub::DispatchKey;

/// An override for one method of one interface.
#[derive(Clone)]
pub struct MethodDelegate {
    pub(crate) interface: &'static Interface,
    pub(crate) method_id: u32,
    pub(crate) key: ObjectKey,
    pub(crate) target: Arc<dyn Dispatch>,
}

impl MethodDelegate {
    pub fn new<T: Remote + ?Sized>(method_id: u32, delegate: Arc<T>) -> Self {
        Self {
            interface: T::interface(),
            method_id,
            key: object_key(&*delegate),
            target: T::stub(delegate),
        }
    }

    pub fn interface(&self) -> &'static Interface {
        self.interface
    }

    pub fn method_id(&self) -> u32 {
        self.method_id
    }

    /// The key the delegate's in-flight dispatches are recorded under.
    pub fn dispatch_key(&self) -> DispatchKey {
        DispatchKey {
            interface: self.interface.name,
            method_id: self.method_id,
            object: self.key,
        }
    }

    pub(crate) fn table_key(&self) -> (&'static str, u32) {
        (self.interface.name, self.method_id)
    }
}

impl std::fmt::Debug for MethodDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodDelegate({}#{} {:?})", self.interface.name, self.method_id, self.key)
    }
}
